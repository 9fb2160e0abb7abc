//! Shared sensor state written by the sampling producer.
//!
//! A [`SensorRecord`] keeps the latest raw sample and its update counter
//! for every [`MeasurementKind`] of one physical sensor. The producer
//! commits through the record; reader sessions take consistent snapshots
//! and sleep on the record's [`ChangeNotifier`] until a commit happens.

pub mod kind;
pub mod notifier;
pub mod record;

pub use kind::{KIND_COUNT, MeasurementKind};
pub use notifier::ChangeNotifier;
pub use record::{SensorId, SensorRecord, Snapshot};
