//! Sensor arena and address-space reservation.

use super::address::{DeviceAddress, SLOTS_PER_SENSOR};
use super::session::{OpenTicket, ReaderSession};
use crate::calibration::{Calibration, Formatter, LookupTables};
use crate::config::Config;
use crate::error::{Result, SensorError};
use crate::sensors::{KIND_COUNT, MeasurementKind, SensorId, SensorRecord};
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Owns every sensor record and hands out reader sessions.
///
/// Setting up the registry reserves `sensors * 8` addresses; teardown
/// releases them. Sessions share the arena, so they stay usable even if
/// they outlive the registry.
pub struct SensorRegistry {
    sensors: Arc<[SensorRecord]>,
    formatter: Formatter,
    slots: u32,
    open_sessions: Arc<AtomicUsize>,
}

impl SensorRegistry {
    /// Allocate `sensor_count` sensors and reserve their address slots.
    pub fn setup(sensor_count: u32, calibration: Arc<dyn Calibration>) -> Result<Self> {
        if sensor_count == 0 {
            return Err(SensorError::InvalidConfig(
                "at least one sensor is required".into(),
            ));
        }
        let slots = sensor_count.checked_mul(SLOTS_PER_SENSOR).ok_or_else(|| {
            SensorError::InvalidConfig(format!("{sensor_count} sensors exceed the address space"))
        })?;

        let sensors: Arc<[SensorRecord]> = (0..sensor_count).map(SensorRecord::new).collect();
        info!(
            "Registered {} sensors ({} address slots)",
            sensor_count, slots
        );

        Ok(Self {
            sensors,
            formatter: Formatter::new(calibration),
            slots,
            open_sessions: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Set up from configuration, calibrating through linear lookup tables.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let tables = LookupTables::linear(&config.calibration)?;
        Self::setup(config.sensors.count, Arc::new(tables))
    }

    pub fn sensor_count(&self) -> u32 {
        self.sensors.len() as u32
    }

    /// Number of reserved addresses.
    pub fn slot_count(&self) -> u32 {
        self.slots
    }

    pub fn sensor(&self, id: SensorId) -> Option<&SensorRecord> {
        self.sensors.get(id as usize)
    }

    /// Sessions opened through this registry that are still alive.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Open a new session on the sensor/kind pair `address` selects.
    pub fn open(&self, address: DeviceAddress) -> Result<ReaderSession> {
        if address.raw() >= self.slots {
            return Err(SensorError::NoSuchDevice(address.raw()));
        }
        let (sensor, kind) = address.decode()?;

        info!("{}: session opened", address);
        Ok(ReaderSession::new(
            address,
            self.sensors.clone(),
            sensor,
            kind,
            self.formatter.clone(),
            OpenTicket::issue(&self.open_sessions),
        ))
    }

    /// Producer path: store one raw sample.
    pub fn commit(&self, sensor: SensorId, kind: MeasurementKind, raw: u16) -> Result<()> {
        self.record(sensor)?.commit(kind, raw);
        Ok(())
    }

    /// Producer path: store one sample per kind, in [`MeasurementKind::ALL`] order.
    pub fn commit_all(&self, sensor: SensorId, raws: [u16; KIND_COUNT]) -> Result<()> {
        self.record(sensor)?.commit_all(raws);
        Ok(())
    }

    fn record(&self, sensor: SensorId) -> Result<&SensorRecord> {
        self.sensor(sensor).ok_or_else(|| {
            SensorError::NoSuchDevice(sensor.saturating_mul(SLOTS_PER_SENSOR))
        })
    }

    /// Release the address reservation.
    pub fn teardown(self) {
        let open = self.open_sessions();
        if open > 0 {
            warn!("Tearing down with {} sessions still open", open);
        }
        info!(
            "Released {} address slots of {} sensors",
            self.slots,
            self.sensors.len()
        );
    }
}
