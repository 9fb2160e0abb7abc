//! Sensor character-device library.
//!
//! Periodically sampled sensors are exposed through per-reader sessions
//! that cache the last calibrated, formatted reading and block at line
//! boundaries until the producer commits a newer sample.
//!
//! - [`sensors`]: shared sample records written by the producer
//! - [`sync`]: fast lock, wait queues, interrupts and session locks
//! - [`calibration`]: raw-to-fixed-point tables and line formatting
//! - [`chrdev`]: addressing, registry and reader sessions
//! - [`input`]: sample producers

pub mod calibration;
pub mod chrdev;
pub mod config;
pub mod error;
pub mod input;
pub mod sensors;
pub mod sync;

pub use chrdev::{DeviceAddress, ReadMode, ReaderSession, SensorRegistry};
pub use error::{Result, SensorError};
pub use sensors::MeasurementKind;
pub use sync::Interrupt;
