//! Per-kind lookup tables.

use super::Calibration;
use crate::config::{CalibrationConfig, LinearCalibration};
use crate::error::{Result, SensorError};
use crate::sensors::{KIND_COUNT, MeasurementKind};

/// One monotonic lookup table per measurement kind, indexed by raw sample.
///
/// Raw samples past the end of a table clamp to its last entry.
#[derive(Debug, Clone)]
pub struct LookupTables {
    tables: [Vec<i64>; KIND_COUNT],
}

impl LookupTables {
    pub fn new(battery: Vec<i64>, temperature: Vec<i64>, light: Vec<i64>) -> Result<Self> {
        let tables = [battery, temperature, light];
        for (kind, table) in MeasurementKind::ALL.iter().zip(&tables) {
            if table.is_empty() {
                return Err(SensorError::InvalidConfig(format!(
                    "empty calibration table for {kind}"
                )));
            }
        }
        Ok(Self { tables })
    }

    /// Build tables of `len` entries by evaluating `f` for every raw value.
    pub fn from_fn(len: usize, f: impl Fn(MeasurementKind, u16) -> i64) -> Result<Self> {
        if len == 0 || len > usize::from(u16::MAX) + 1 {
            return Err(SensorError::InvalidConfig(format!(
                "calibration table length {len} out of range"
            )));
        }
        let build = |kind| (0..len).map(|raw| f(kind, raw as u16)).collect::<Vec<i64>>();
        Self::new(
            build(MeasurementKind::Battery),
            build(MeasurementKind::Temperature),
            build(MeasurementKind::Light),
        )
    }

    /// Build tables from the linear parameters in the configuration.
    pub fn linear(config: &CalibrationConfig) -> Result<Self> {
        Self::from_fn(config.table_len, |kind, raw| {
            config.for_kind(kind).evaluate(raw)
        })
    }

    pub fn table(&self, kind: MeasurementKind) -> &[i64] {
        &self.tables[kind.index()]
    }
}

impl LinearCalibration {
    fn evaluate(&self, raw: u16) -> i64 {
        self.offset_milli + (f64::from(raw) * self.milli_per_step).round() as i64
    }
}

impl Calibration for LookupTables {
    fn convert(&self, kind: MeasurementKind, raw: u16) -> i64 {
        let table = self.table(kind);
        table
            .get(usize::from(raw))
            .or_else(|| table.last())
            .copied()
            .unwrap_or_default()
    }
}
