//! Interruptible blocking lock for per-session state.

use super::interrupt::Interrupt;
use super::wait_queue::WaitQueue;
use crate::error::Result;
use parking_lot::{Mutex, MutexGuard};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A binary semaphore owning the data it serializes.
///
/// Unlike a plain mutex, waiting for it can be cancelled through an
/// [`Interrupt`]. The guard may be held across slow work (formatting,
/// copying to a caller) but must be dropped before sleeping elsewhere.
pub struct SessionLock<T> {
    held: AtomicBool,
    queue: Arc<WaitQueue>,
    data: Mutex<T>,
}

impl<T> SessionLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            held: AtomicBool::new(false),
            queue: Arc::new(WaitQueue::new()),
            data: Mutex::new(value),
        }
    }

    /// Acquire the lock, sleeping while another context holds it.
    pub fn acquire(&self, interrupt: &Interrupt) -> Result<SessionGuard<'_, T>> {
        self.queue.wait_until(interrupt, || self.claim())?;
        Ok(SessionGuard {
            lock: self,
            data: self.data.lock(),
        })
    }

    /// Acquire the lock only if nobody holds it.
    pub fn try_acquire(&self) -> Option<SessionGuard<'_, T>> {
        self.claim().then(|| SessionGuard {
            lock: self,
            data: self.data.lock(),
        })
    }

    /// Run `f` on the data without taking the session lock.
    ///
    /// Holders of a [`SessionGuard`] keep the inner mutex too, so `f` still
    /// sees a consistent value; it just cannot be interrupted or starved.
    pub fn inspect<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.data.lock())
    }

    pub fn is_locked(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    fn claim(&self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }
}

/// RAII access to a [`SessionLock`]'s data; releases on every exit path.
pub struct SessionGuard<'a, T> {
    lock: &'a SessionLock<T>,
    data: MutexGuard<'a, T>,
}

impl<T> Deref for SessionGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for SessionGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

impl<T> Drop for SessionGuard<'_, T> {
    fn drop(&mut self) {
        // The inner mutex guard is released right after this body; a woken
        // claimant blocks on it for that instant only.
        self.lock.held.store(false, Ordering::Release);
        self.lock.queue.wake_all();
    }
}
