//! Raw sample calibration and text formatting.
//!
//! Calibration maps `(kind, raw)` to a fixed-point value scaled by 1000;
//! the formatter renders that value as the decimal line handed to readers.

pub mod format;
pub mod table;

pub use format::{FormattedLine, Formatter, LINE_CAPACITY, format_reading, parse_reading};
pub use table::LookupTables;

use crate::sensors::MeasurementKind;

/// Converts a raw sample into a calibrated value in thousandths.
///
/// Implementations must be total: an out-of-range raw sample is handled
/// here (clamped, extrapolated), never reported as an error.
pub trait Calibration: Send + Sync {
    fn convert(&self, kind: MeasurementKind, raw: u16) -> i64;
}

impl<F> Calibration for F
where
    F: Fn(MeasurementKind, u16) -> i64 + Send + Sync,
{
    fn convert(&self, kind: MeasurementKind, raw: u16) -> i64 {
        self(kind, raw)
    }
}
