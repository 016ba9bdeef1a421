use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a raw sensor driver could not produce a reading.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensorFault {
    /// The port reports no device, or the device stopped answering.
    #[error("sensor disconnected")]
    Disconnected,

    /// The transaction completed, but later than the allowed read deadline.
    #[error("sensor read took {elapsed_ms} ms (limit {limit_ms} ms)")]
    Timeout { elapsed_ms: u64, limit_ms: u64 },

    /// The driver returned a value that cannot be a rotation (NaN, ±inf, …).
    #[error("malformed reading: {0}")]
    MalformedReading(String),
}

/// Error type for every tracking-wheel operation.
///
/// `reset` and `distance_traveled` only ever fail with
/// [`TrackingError::SensorUnavailable`]; the other variants come from
/// construction and wheel-set lookups.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrackingError {
    #[error("Sensor Unavailable on {wheel}: {fault}")]
    SensorUnavailable { wheel: String, fault: SensorFault },

    #[error("Invalid Calibration for {wheel}: {details}")]
    InvalidCalibration { wheel: String, details: String },

    #[error("Unknown tracking wheel: {0}")]
    UnknownWheel(String),
}

impl TrackingError {
    /// Build a [`TrackingError::SensorUnavailable`] for `wheel`.
    pub fn unavailable(wheel: &str, fault: SensorFault) -> Self {
        Self::SensorUnavailable {
            wheel: wheel.to_string(),
            fault,
        }
    }

    /// `true` for the recoverable "no new information this cycle" condition.
    pub fn is_sensor_unavailable(&self) -> bool {
        matches!(self, Self::SensorUnavailable { .. })
    }
}

fn default_gear_ratio() -> f32 {
    1.0
}

/// Fixed physical parameters of one tracking wheel.
///
/// All lengths are in inches.  Values are supplied once at construction and
/// never change for the lifetime of the wheel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelCalibration {
    /// Effective rolling diameter of the wheel.
    pub diameter: f32,
    /// Signed distance from the robot's center of rotation to the wheel's
    /// contact line.
    pub offset: f32,
    /// Wheel revolutions per sensor revolution.
    #[serde(default = "default_gear_ratio")]
    pub gear_ratio: f32,
    /// Set when the sensor counts up while the wheel rolls backwards.
    #[serde(default)]
    pub reversed: bool,
}

impl WheelCalibration {
    /// Calibration for a directly coupled, non-reversed wheel.
    pub fn new(diameter: f32, offset: f32) -> Self {
        Self {
            diameter,
            offset,
            gear_ratio: default_gear_ratio(),
            reversed: false,
        }
    }

    pub fn with_gear_ratio(mut self, gear_ratio: f32) -> Self {
        self.gear_ratio = gear_ratio;
        self
    }

    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    /// Distance covered by one full wheel revolution.
    pub fn circumference(&self) -> f32 {
        std::f32::consts::PI * self.diameter
    }

    /// Linear distance per sensor revolution, sign included.
    pub fn distance_per_sensor_revolution(&self) -> f32 {
        let sign = if self.reversed { -1.0 } else { 1.0 };
        sign * self.gear_ratio * self.circumference()
    }

    /// Reject geometry that cannot describe a physical wheel.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::InvalidCalibration`] when the diameter or gear
    /// ratio is not a positive finite number, or the offset is not finite.
    pub fn validate(&self, wheel: &str) -> Result<(), TrackingError> {
        let invalid = |details: String| TrackingError::InvalidCalibration {
            wheel: wheel.to_string(),
            details,
        };
        if !(self.diameter.is_finite() && self.diameter > 0.0) {
            return Err(invalid(format!(
                "diameter must be positive, got {}",
                self.diameter
            )));
        }
        if !(self.gear_ratio.is_finite() && self.gear_ratio > 0.0) {
            return Err(invalid(format!(
                "gear ratio must be positive, got {}",
                self.gear_ratio
            )));
        }
        if !self.offset.is_finite() {
            return Err(invalid(format!("offset must be finite, got {}", self.offset)));
        }
        Ok(())
    }
}

/// One wheel's reading for a single odometry cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelSample {
    pub wheel_id: String,
    pub offset: f32,
    /// Net signed travel since the last reset.  `Err` means the wheel has no
    /// new information for this cycle.
    pub distance: Result<f32, TrackingError>,
    pub sampled_at: DateTime<Utc>,
}

impl WheelSample {
    /// The distance, or `None` when the sensor was unavailable.
    pub fn distance(&self) -> Option<f32> {
        self.distance.as_ref().ok().copied()
    }
}
