//! Character-device style access to sensor readings.
//!
//! Every `(sensor, kind)` pair is reachable through a [`DeviceAddress`].
//! Opening an address yields a [`ReaderSession`] which caches the last
//! formatted line for its pair and streams it to the caller, blocking at
//! line boundaries until the producer commits something newer.

pub mod address;
pub mod registry;
pub mod session;

pub use address::{DeviceAddress, SLOTS_PER_SENSOR, TYPE_BITS};
pub use registry::SensorRegistry;
pub use session::{ReadMode, ReaderSession};
