use crate::error::{Result, SensorError};
use crate::sensors::MeasurementKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Load environment variables from a local .env file.
/// Values may contain spaces without quotes; existing variables win.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    let Ok(content) = fs::read_to_string(env_path) else {
        return;
    };

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let mut value = value.trim();

        if (value.starts_with('"') && value.ends_with('"') && value.len() >= 2)
            || (value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2)
        {
            value = &value[1..value.len() - 1];
        }

        if std::env::var(key).is_err() {
            // SAFETY: called from main before any other thread is spawned
            unsafe { std::env::set_var(key, value) };
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sensors: SensorsConfig,
    pub simulation: SimulationConfig,
    pub calibration: CalibrationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorsConfig {
    /// Number of physical sensors; each gets 8 address slots.
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Sampling period of the simulated producer.
    pub interval_ms: u64,
    /// Largest change of a raw sample between two ticks.
    pub max_step: u16,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

/// Linear raw-to-milli-unit mapping: `offset_milli + raw * milli_per_step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearCalibration {
    pub offset_milli: i64,
    pub milli_per_step: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Entries per lookup table (raw samples are 12 bit by default).
    pub table_len: usize,
    pub battery: LinearCalibration,
    pub temperature: LinearCalibration,
    pub light: LinearCalibration,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self { count: 4 }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_step: 64,
            seed: None,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            table_len: 4096,
            // 0 .. 3.3 V
            battery: LinearCalibration {
                offset_milli: 0,
                milli_per_step: 0.806,
            },
            // -40 .. 123.8 °C
            temperature: LinearCalibration {
                offset_milli: -40_000,
                milli_per_step: 40.0,
            },
            // 0 .. 100 %
            light: LinearCalibration {
                offset_milli: 0,
                milli_per_step: 24.42,
            },
        }
    }
}

impl CalibrationConfig {
    pub fn for_kind(&self, kind: MeasurementKind) -> &LinearCalibration {
        match kind {
            MeasurementKind::Battery => &self.battery,
            MeasurementKind::Temperature => &self.temperature,
            MeasurementKind::Light => &self.light,
        }
    }
}

impl Config {
    /// Load a JSON configuration file; missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `SENSOR_*` environment variables.
    /// Unparsable values are ignored.
    pub fn apply_env(&mut self) {
        if let Ok(count) = std::env::var("SENSOR_COUNT")
            && let Ok(c) = count.parse()
        {
            self.sensors.count = c;
        }
        if let Ok(interval) = std::env::var("SENSOR_INTERVAL_MS")
            && let Ok(i) = interval.parse()
        {
            self.simulation.interval_ms = i;
        }
        if let Ok(step) = std::env::var("SENSOR_MAX_STEP")
            && let Ok(s) = step.parse()
        {
            self.simulation.max_step = s;
        }
        if let Ok(seed) = std::env::var("SENSOR_SEED")
            && let Ok(s) = seed.parse()
        {
            self.simulation.seed = Some(s);
        }
    }

    /// Where the binary looks for a configuration file when none is given.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sensor-chrdev").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.sensors.count == 0 {
            return Err(SensorError::InvalidConfig(
                "sensors.count must be at least 1".into(),
            ));
        }
        if self.simulation.interval_ms == 0 {
            return Err(SensorError::InvalidConfig(
                "simulation.interval_ms must be positive".into(),
            ));
        }
        if self.calibration.table_len == 0 {
            return Err(SensorError::InvalidConfig(
                "calibration.table_len must be positive".into(),
            ));
        }
        Ok(())
    }
}
