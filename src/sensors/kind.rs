//! Measurement types reported by every sensor.

use strum::{Display, EnumString, FromRepr};

/// Number of measurement kinds per sensor.
pub const KIND_COUNT: usize = 3;

/// The closed set of quantities a sensor reports.
///
/// The discriminant is the value stored in the type bits of a device
/// address; the string form is the device node suffix (`sensor0-temp`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, FromRepr, Display, EnumString)]
#[repr(u8)]
pub enum MeasurementKind {
    /// Supply voltage
    #[strum(serialize = "batt")]
    Battery = 0,
    /// Ambient temperature
    #[strum(serialize = "temp")]
    Temperature = 1,
    /// Light intensity
    #[strum(serialize = "light")]
    Light = 2,
}

impl MeasurementKind {
    pub const ALL: [MeasurementKind; KIND_COUNT] = [
        MeasurementKind::Battery,
        MeasurementKind::Temperature,
        MeasurementKind::Light,
    ];

    /// Position of this kind in per-sensor arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Decode the type bits of a device address.
    pub fn from_bits(bits: u32) -> Option<Self> {
        u8::try_from(bits).ok().and_then(Self::from_repr)
    }
}
