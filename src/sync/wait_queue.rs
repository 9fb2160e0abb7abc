//! Predicate based sleeping with interrupt support.

use super::interrupt::Interrupt;
use crate::error::{Result, SensorError};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// A condition variable paired with its own mutex.
///
/// Waiters sleep until a caller supplied predicate holds. The predicate is
/// evaluated under the queue mutex after every wake-up, and wakers take the
/// same mutex before notifying, so a state change made before
/// [`WaitQueue::wake_all`] can never be missed.
#[derive(Default)]
pub struct WaitQueue {
    lock: Mutex<()>,
    cond: Condvar,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep until `condition` returns true.
    ///
    /// Returns immediately if the condition already holds. Otherwise fails
    /// with [`SensorError::Interrupted`] as soon as `interrupt` is raised,
    /// whether it was raised before or during the wait.
    pub fn wait_until<F>(self: &Arc<Self>, interrupt: &Interrupt, mut condition: F) -> Result<()>
    where
        F: FnMut() -> bool,
    {
        let _parked = interrupt.park(self);
        let mut guard = self.lock.lock();
        loop {
            if condition() {
                return Ok(());
            }
            if interrupt.is_raised() {
                return Err(SensorError::Interrupted);
            }
            self.cond.wait(&mut guard);
        }
    }

    /// Wake every waiter so it re-evaluates its predicate.
    pub fn wake_all(&self) {
        let _guard = self.lock.lock();
        self.cond.notify_all();
    }
}
