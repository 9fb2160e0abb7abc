//! Flat device addressing: `sensor << 3 | kind`.

use crate::error::{Result, SensorError};
use crate::sensors::{MeasurementKind, SensorId};
use std::fmt;
use std::str::FromStr;

/// Number of low address bits selecting the measurement kind.
pub const TYPE_BITS: u32 = 3;

/// Address slots reserved per sensor, used or not.
pub const SLOTS_PER_SENSOR: u32 = 1 << TYPE_BITS;

const TYPE_MASK: u32 = SLOTS_PER_SENSOR - 1;

/// Opaque address of one sensor/kind pair (the device minor number).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceAddress(u32);

impl DeviceAddress {
    /// Encode a sensor index and kind.
    ///
    /// Fails for sensor indices that do not fit next to the type bits.
    pub fn new(sensor: SensorId, kind: MeasurementKind) -> Result<Self> {
        sensor
            .checked_mul(SLOTS_PER_SENSOR)
            .map(|base| Self(base | kind as u32))
            .ok_or_else(|| SensorError::InvalidDeviceName(format!("sensor{sensor}-{kind}")))
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn sensor(self) -> SensorId {
        self.0 >> TYPE_BITS
    }

    /// The kind selected by the type bits, if it is a known one.
    pub fn kind(self) -> Option<MeasurementKind> {
        MeasurementKind::from_bits(self.0 & TYPE_MASK)
    }

    /// Split into sensor index and kind, rejecting unknown kinds.
    pub fn decode(self) -> Result<(SensorId, MeasurementKind)> {
        let kind = self.kind().ok_or(SensorError::NoSuchDevice(self.0))?;
        Ok((self.sensor(), kind))
    }
}

/// Node name, e.g. `sensor3-temp`, or the bare number for unknown kinds.
impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "sensor{}-{}", self.sensor(), kind),
            None => write!(f, "address {}", self.0),
        }
    }
}

/// Parses node names such as `sensor0-batt` or `/dev/sensor12-light`.
impl FromStr for DeviceAddress {
    type Err = SensorError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SensorError::InvalidDeviceName(s.to_string());
        let name = s.rsplit('/').next().unwrap_or(s);
        let (sensor, kind) = name
            .strip_prefix("sensor")
            .and_then(|rest| rest.split_once('-'))
            .ok_or_else(invalid)?;
        let sensor: SensorId = sensor.parse().map_err(|_| invalid())?;
        let kind: MeasurementKind = kind.parse().map_err(|_| invalid())?;
        Self::new(sensor, kind).map_err(|_| invalid())
    }
}
