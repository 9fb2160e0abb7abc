//! Sensor change notifier for blocked readers.
//!
//! When the producer commits a new sample it wakes every reader sleeping on
//! the sensor so each one can re-check whether its cached line is stale.

use super::record::SensorId;
use crate::error::Result;
use crate::sync::{Interrupt, WaitQueue};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Wakes reader sessions when a sensor's samples change.
///
/// Waiters supply a predicate rather than relying on a one-shot flag, so a
/// commit that lands between the reader's staleness check and its sleep is
/// never lost and spurious wake-ups are absorbed.
///
/// # Usage
/// ```ignore
/// // Producer, after updating the record:
/// record.notifier().notify();
///
/// // Reader:
/// record.notifier().wait_until(&interrupt, || record.last_update(kind) != seen)?;
/// ```
pub struct ChangeNotifier {
    queue: Arc<WaitQueue>,
    sensor_id: SensorId,
    notifications: AtomicU64,
    waits: AtomicU64,
}

impl ChangeNotifier {
    /// Create a notifier for the sensor with the given id.
    pub fn new(sensor_id: SensorId) -> Self {
        Self {
            queue: Arc::new(WaitQueue::new()),
            sensor_id,
            notifications: AtomicU64::new(0),
            waits: AtomicU64::new(0),
        }
    }

    /// Get the sensor ID this notifier belongs to.
    pub fn sensor_id(&self) -> SensorId {
        self.sensor_id
    }

    /// Notify that this sensor's data changed.
    ///
    /// Wakes every waiter. Only takes the queue mutex for the duration of
    /// the wake-up itself, so this never stalls behind a slow reader.
    pub fn notify(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
        self.queue.wake_all();
    }

    /// Sleep until `condition` holds or `interrupt` is raised.
    pub fn wait_until<F>(&self, interrupt: &Interrupt, condition: F) -> Result<()>
    where
        F: FnMut() -> bool,
    {
        self.waits.fetch_add(1, Ordering::Relaxed);
        self.queue.wait_until(interrupt, condition)
    }

    /// Number of times [`ChangeNotifier::notify`] was called.
    pub fn notification_count(&self) -> u64 {
        self.notifications.load(Ordering::Relaxed)
    }

    /// Number of times a reader entered [`ChangeNotifier::wait_until`].
    pub fn wait_count(&self) -> u64 {
        self.waits.load(Ordering::Relaxed)
    }
}
