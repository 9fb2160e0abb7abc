//! Short, non-sleeping critical sections for producer-owned data.

use parking_lot::Mutex;

/// Mutual exclusion for data the producer updates from a latency sensitive
/// context.
///
/// The guard never leaves [`FastLock::with`], so the lock cannot be carried
/// across formatting, copy-out or a sleep. Closures passed to `with` must do
/// O(1) work.
pub struct FastLock<T> {
    inner: Mutex<T>,
}

impl<T> FastLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Run `f` with exclusive access to the protected value.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}

impl<T: Default> Default for FastLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
