//! Producers feeding samples into the sensor registry.
//!
//! Current producers:
//! - `simulation`: periodic random-walk samples for development and demos

pub mod simulation;

pub use simulation::run_sensor_simulation;
