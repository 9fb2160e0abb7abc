//! Sensor simulation for testing.
//!
//! Stands in for the sampling subsystem: raw samples wander randomly and
//! are committed to every sensor on a fixed period, waking blocked readers.

use crate::chrdev::SensorRegistry;
use crate::config::SimulationConfig;
use crate::sensors::{KIND_COUNT, SensorId};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};

/// Bounded random walk of raw samples, one walker per sensor and kind.
pub struct SampleWalk {
    rng: StdRng,
    samples: Vec<[u16; KIND_COUNT]>,
    max_step: u16,
    max_raw: u16,
}

impl SampleWalk {
    /// Start every walker mid-range. `max_raw` is the largest raw value
    /// the calibration tables cover.
    pub fn new(sensors: usize, max_raw: u16, max_step: u16, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            samples: vec![[max_raw / 2; KIND_COUNT]; sensors],
            max_step,
            max_raw,
        }
    }

    /// Advance every walker one step and return the new samples.
    pub fn step(&mut self) -> &[[u16; KIND_COUNT]] {
        let step = i32::from(self.max_step);
        for packet in &mut self.samples {
            for raw in packet.iter_mut() {
                let delta = self.rng.gen_range(-step..=step);
                *raw = (i32::from(*raw) + delta).clamp(0, i32::from(self.max_raw)) as u16;
            }
        }
        &self.samples
    }
}

/// Spawn a task that commits a fresh packet to every sensor each interval.
///
/// # Returns
///
/// A `JoinHandle` that can be used to abort the simulation task.
pub fn run_sensor_simulation(
    registry: Arc<SensorRegistry>,
    config: SimulationConfig,
    table_len: usize,
) -> JoinHandle<()> {
    let max_raw = u16::try_from(table_len.saturating_sub(1)).unwrap_or(u16::MAX);
    let mut walk = SampleWalk::new(
        registry.sensor_count() as usize,
        max_raw,
        config.max_step,
        config.seed,
    );

    tokio::spawn(async move {
        info!(
            "[Sim] Sampling {} sensors every {} ms",
            registry.sensor_count(),
            config.interval_ms
        );
        let mut interval = interval(Duration::from_millis(config.interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            for (id, packet) in walk.step().iter().enumerate() {
                if let Err(e) = registry.commit_all(id as SensorId, *packet) {
                    warn!("[Sim] Failed to commit sensor {}: {}", id, e);
                }
            }
            debug!("[Sim] Committed packets for {} sensors", registry.sensor_count());
        }
    })
}
