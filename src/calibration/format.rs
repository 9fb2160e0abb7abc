//! Fixed-point to text conversion.

use super::Calibration;
use crate::sensors::MeasurementKind;
use std::fmt::Write;
use std::sync::Arc;

/// Capacity of one formatted line; any `i64` reading fits.
pub const LINE_CAPACITY: usize = 32;

pub type FormattedLine = heapless::String<LINE_CAPACITY>;

/// Render a value scaled by 1000 as `"<value / 1000>.<|value| % 1000>\n"`.
///
/// The sign lives in the integer part only; the fraction is always three
/// unsigned digits. Values in (-1, 0) keep their sign as `-0.xxx`.
pub fn format_reading(value: i64) -> FormattedLine {
    let integer = value / 1000;
    let fraction = (value % 1000).unsigned_abs();
    let sign = if value < 0 && integer == 0 { "-" } else { "" };

    let mut line = FormattedLine::new();
    let written = writeln!(line, "{sign}{integer}.{fraction:03}");
    debug_assert!(written.is_ok(), "reading exceeds line capacity");
    line
}

/// Inverse of [`format_reading`]; `None` if `text` is not a reading line.
pub fn parse_reading(text: &str) -> Option<i64> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    let (integer, fraction) = text.split_once('.')?;
    if fraction.len() != 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let negative = integer.starts_with('-');
    let integer: i64 = integer.parse().ok()?;
    let fraction: i64 = fraction.parse().ok()?;
    let magnitude = integer.checked_abs()?.checked_mul(1000)?.checked_add(fraction)?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Formats raw samples through a calibration.
#[derive(Clone)]
pub struct Formatter {
    calibration: Arc<dyn Calibration>,
}

impl Formatter {
    pub fn new(calibration: Arc<dyn Calibration>) -> Self {
        Self { calibration }
    }

    pub fn format(&self, kind: MeasurementKind, raw: u16) -> FormattedLine {
        format_reading(self.calibration.convert(kind, raw))
    }
}
