//! Simulated sampling hardware.

pub mod sensors;

pub use sensors::{SampleWalk, run_sensor_simulation};
