//! Cancellation of blocking waits.

use super::wait_queue::WaitQueue;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cancellation request for blocking calls.
///
/// Cloning yields another handle to the same request. Raising it wakes
/// every [`WaitQueue`] a holder is currently parked on; the sleeping call
/// then returns [`SensorError::Interrupted`](crate::error::SensorError::Interrupted).
/// The request stays pending until [`Interrupt::reset`], so a call issued
/// while it is pending fails instead of sleeping.
#[derive(Clone, Default)]
pub struct Interrupt {
    inner: Arc<InterruptInner>,
}

#[derive(Default)]
struct InterruptInner {
    raised: AtomicBool,
    parked: Mutex<Vec<Arc<WaitQueue>>>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake any parked waiter.
    pub fn raise(&self) {
        self.inner.raised.store(true, Ordering::SeqCst);
        for queue in self.inner.parked.lock().iter() {
            queue.wake_all();
        }
    }

    pub fn is_raised(&self) -> bool {
        self.inner.raised.load(Ordering::SeqCst)
    }

    /// Clear a pending request so the interrupted call can be retried.
    pub fn reset(&self) {
        self.inner.raised.store(false, Ordering::SeqCst);
    }

    /// Register `queue` as the place a holder of this handle is sleeping.
    ///
    /// Must be called before the waiter checks [`Interrupt::is_raised`]
    /// under the queue mutex.
    pub(crate) fn park(&self, queue: &Arc<WaitQueue>) -> Parked<'_> {
        self.inner.parked.lock().push(queue.clone());
        Parked {
            interrupt: self,
            queue: queue.clone(),
        }
    }
}

/// Registration of a waiter on a queue; unregisters on drop.
pub(crate) struct Parked<'a> {
    interrupt: &'a Interrupt,
    queue: Arc<WaitQueue>,
}

impl Drop for Parked<'_> {
    fn drop(&mut self) {
        let mut parked = self.interrupt.inner.parked.lock();
        if let Some(pos) = parked.iter().position(|q| Arc::ptr_eq(q, &self.queue)) {
            parked.swap_remove(pos);
        }
    }
}
