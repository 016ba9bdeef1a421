//! Chassis configuration – which tracking wheels exist and how they are
//! calibrated, read from TOML.
//!
//! ```toml
//! read_deadline_ms = 10
//!
//! [[wheels]]
//! id = "vertical"
//! diameter = 2.75
//! offset = 0.5
//! sensor = { kind = "rotation" }
//!
//! [[wheels]]
//! id = "horizontal"
//! diameter = 2.75
//! offset = -3.0
//! reversed = true
//! sensor = { kind = "encoder", ticks_per_revolution = 360.0 }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use odotrack_types::{TrackingError, WheelCalibration};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deadline::DEFAULT_READ_DEADLINE;

/// Errors raised while loading a [`ChassisConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] TrackingError),

    #[error("duplicate tracking wheel id '{0}'")]
    DuplicateWheel(String),
}

/// The raw sensor a wheel is read from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SensorSpec {
    Encoder { ticks_per_revolution: f32 },
    Rotation,
    Motor,
}

/// One `[[wheels]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelConfig {
    pub id: String,
    #[serde(flatten)]
    pub calibration: WheelCalibration,
    pub sensor: SensorSpec,
}

fn default_read_deadline_ms() -> u64 {
    DEFAULT_READ_DEADLINE.as_millis() as u64
}

/// Every tracking wheel on the chassis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChassisConfig {
    /// Per-read sensor latency limit in milliseconds.
    #[serde(default = "default_read_deadline_ms")]
    pub read_deadline_ms: u64,

    #[serde(default)]
    pub wheels: Vec<WheelConfig>,
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            read_deadline_ms: default_read_deadline_ms(),
            wheels: Vec::new(),
        }
    }
}

impl ChassisConfig {
    pub fn read_deadline(&self) -> Duration {
        Duration::from_millis(self.read_deadline_ms)
    }

    /// Check every wheel's calibration and that ids are unique.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] or [`ConfigError::DuplicateWheel`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_deadline_ms == 0 {
            return Err(TrackingError::InvalidCalibration {
                wheel: "*".to_string(),
                details: "read_deadline_ms must be at least 1".to_string(),
            }
            .into());
        }
        for (i, wheel) in self.wheels.iter().enumerate() {
            if self.wheels[..i].iter().any(|w| w.id == wheel.id) {
                return Err(ConfigError::DuplicateWheel(wheel.id.clone()));
            }
            wheel.calibration.validate(&wheel.id)?;
            if let SensorSpec::Encoder {
                ticks_per_revolution,
            } = wheel.sensor
                && !(ticks_per_revolution.is_finite() && ticks_per_revolution > 0.0)
            {
                return Err(TrackingError::InvalidCalibration {
                    wheel: wheel.id.clone(),
                    details: format!(
                        "ticks per revolution must be positive, got {ticks_per_revolution}"
                    ),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Parse and validate a configuration held in memory.  Environment overrides
/// are not applied.
pub fn parse(raw: &str) -> Result<ChassisConfig, ConfigError> {
    let cfg: ChassisConfig = toml::from_str(raw)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load the config from `path`.  Returns `None` if the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<ChassisConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg: ChassisConfig = toml::from_str(&raw)?;
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(Some(cfg))
}

/// Apply `ODOTRACK_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `ODOTRACK_READ_DEADLINE_MS` | `read_deadline_ms` |
pub fn apply_env_overrides(cfg: &mut ChassisConfig) {
    apply_overrides_from(cfg, |key| std::env::var(key).ok());
}

/// Override lookup extracted so tests do not have to mutate the environment.
pub(crate) fn apply_overrides_from(
    cfg: &mut ChassisConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("ODOTRACK_READ_DEADLINE_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.read_deadline_ms = ms;
    }
}
