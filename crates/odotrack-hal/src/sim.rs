//! In-process simulated sensors for testing without physical hardware.
//!
//! A [`SimShaft`] stands in for the physical shaft a sensor is mounted on.
//! Tests turn it, unplug it or slow it down; the simulated drivers
//! ([`SimEncoder`], [`SimRotationSensor`], [`SimMotor`]) read it the way a
//! real driver reads its port.  [`SimChassis`] wires shafts, drivers and
//! adapters into a ready [`TrackingWheelSet`].
//!
//! # Example
//!
//! ```rust
//! use odotrack_hal::sim::SimChassis;
//! use odotrack_types::WheelCalibration;
//!
//! let (mut wheels, shafts) = SimChassis::new()
//!     .with_rotation_wheel("vertical", WheelCalibration::new(2.75, 0.5))
//!     .build()
//!     .expect("valid calibration");
//!
//! shafts["vertical"].rotate(1.0);
//! let travelled = wheels.sample("vertical").unwrap().distance().unwrap();
//! assert!((travelled - std::f32::consts::PI * 2.75).abs() < 1e-3);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use odotrack_types::{SensorFault, TrackingError, WheelCalibration};

use crate::config::{ChassisConfig, SensorSpec};
use crate::deadline::ReadDeadline;
use crate::encoder::EncoderWheel;
use crate::motor::MotorWheel;
use crate::rotation::RotationWheel;
use crate::sensor::{AbsoluteRotationSensor, IncrementalEncoder, MotorEncoder};
use crate::tracking_wheel::TrackingWheel;
use crate::wheel_set::TrackingWheelSet;

// ────────────────────────────────────────────────────────────────────────────
// Simulated shaft
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ShaftState {
    revolutions: f64,
    disconnected: bool,
    malformed: bool,
    latency: Duration,
}

/// Shared handle to a simulated sensor shaft.
///
/// Clones refer to the same shaft, so a test keeps one handle while the
/// driver owns another.
#[derive(Debug, Clone, Default)]
pub struct SimShaft {
    state: Arc<Mutex<ShaftState>>,
}

impl SimShaft {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ShaftState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Turn the shaft by `revolutions` (negative turns it backwards).
    pub fn rotate(&self, revolutions: f64) {
        self.state().revolutions += revolutions;
    }

    /// Total revolutions since the shaft was created.
    pub fn revolutions(&self) -> f64 {
        self.state().revolutions
    }

    /// Make every subsequent read fail with [`SensorFault::Disconnected`].
    pub fn disconnect(&self) {
        self.state().disconnected = true;
    }

    pub fn reconnect(&self) {
        self.state().disconnected = false;
    }

    /// Make the driver return garbage instead of a rotation.
    pub fn set_malformed(&self, malformed: bool) {
        self.state().malformed = malformed;
    }

    /// Delay every read by `latency` before answering.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = latency;
    }

    /// Wait out the configured latency, then snapshot the shaft.
    fn sample(&self) -> Result<(f64, bool), SensorFault> {
        let latency = self.state().latency;
        if !latency.is_zero() {
            thread::sleep(latency);
        }
        let state = self.state();
        if state.disconnected {
            return Err(SensorFault::Disconnected);
        }
        Ok((state.revolutions, state.malformed))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated drivers
// ────────────────────────────────────────────────────────────────────────────

/// Simulated quadrature encoder with a fixed resolution.
pub struct SimEncoder {
    shaft: SimShaft,
    ticks_per_revolution: f64,
}

impl SimEncoder {
    pub fn new(shaft: SimShaft, ticks_per_revolution: f64) -> Self {
        Self {
            shaft,
            ticks_per_revolution,
        }
    }
}

impl IncrementalEncoder for SimEncoder {
    fn ticks(&mut self) -> Result<i32, SensorFault> {
        let (revolutions, malformed) = self.shaft.sample()?;
        if malformed {
            return Err(SensorFault::MalformedReading(
                "quadrature phase error".to_string(),
            ));
        }
        Ok((revolutions * self.ticks_per_revolution).round() as i32)
    }
}

/// Simulated multi-turn rotation sensor.  A malformed shaft reads `NaN`.
pub struct SimRotationSensor {
    shaft: SimShaft,
}

impl SimRotationSensor {
    pub fn new(shaft: SimShaft) -> Self {
        Self { shaft }
    }
}

impl AbsoluteRotationSensor for SimRotationSensor {
    fn position_degrees(&mut self) -> Result<f32, SensorFault> {
        let (revolutions, malformed) = self.shaft.sample()?;
        if malformed {
            return Ok(f32::NAN);
        }
        Ok((revolutions * 360.0) as f32)
    }
}

/// Simulated motor encoder.  A malformed shaft reads infinity.
pub struct SimMotor {
    shaft: SimShaft,
}

impl SimMotor {
    pub fn new(shaft: SimShaft) -> Self {
        Self { shaft }
    }
}

impl MotorEncoder for SimMotor {
    fn position_revolutions(&mut self) -> Result<f32, SensorFault> {
        let (revolutions, malformed) = self.shaft.sample()?;
        if malformed {
            return Ok(f32::INFINITY);
        }
        Ok(revolutions as f32)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimChassis builder
// ────────────────────────────────────────────────────────────────────────────

enum SimWheelKind {
    Encoder { ticks_per_revolution: f32 },
    Rotation,
    Motor,
}

struct SimWheelEntry {
    id: String,
    calibration: WheelCalibration,
    kind: SimWheelKind,
}

/// Builder that constructs a [`TrackingWheelSet`] backed by simulated
/// sensors, plus the shaft handles tests use to move them.
#[derive(Default)]
pub struct SimChassis {
    wheels: Vec<SimWheelEntry>,
    read_deadline: Option<Duration>,
}

impl SimChassis {
    pub fn new() -> Self {
        Self::default()
    }

    /// One simulated wheel per entry of a parsed chassis configuration.
    pub fn from_config(config: &ChassisConfig) -> Self {
        let wheels = config
            .wheels
            .iter()
            .map(|w| SimWheelEntry {
                id: w.id.clone(),
                calibration: w.calibration,
                kind: match w.sensor {
                    SensorSpec::Encoder {
                        ticks_per_revolution,
                    } => SimWheelKind::Encoder {
                        ticks_per_revolution,
                    },
                    SensorSpec::Rotation => SimWheelKind::Rotation,
                    SensorSpec::Motor => SimWheelKind::Motor,
                },
            })
            .collect();
        Self {
            wheels,
            read_deadline: Some(config.read_deadline()),
        }
    }

    /// Per-read latency limit applied to every wheel.
    pub fn with_read_deadline(mut self, limit: Duration) -> Self {
        self.read_deadline = Some(limit);
        self
    }

    pub fn with_encoder_wheel(
        mut self,
        id: impl Into<String>,
        calibration: WheelCalibration,
        ticks_per_revolution: f32,
    ) -> Self {
        self.wheels.push(SimWheelEntry {
            id: id.into(),
            calibration,
            kind: SimWheelKind::Encoder {
                ticks_per_revolution,
            },
        });
        self
    }

    pub fn with_rotation_wheel(
        mut self,
        id: impl Into<String>,
        calibration: WheelCalibration,
    ) -> Self {
        self.wheels.push(SimWheelEntry {
            id: id.into(),
            calibration,
            kind: SimWheelKind::Rotation,
        });
        self
    }

    pub fn with_motor_wheel(mut self, id: impl Into<String>, calibration: WheelCalibration) -> Self {
        self.wheels.push(SimWheelEntry {
            id: id.into(),
            calibration,
            kind: SimWheelKind::Motor,
        });
        self
    }

    /// Consume the builder and return the wheel set and one shaft per wheel id.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::InvalidCalibration`] if any wheel's geometry is
    /// rejected.
    pub fn build(self) -> Result<(TrackingWheelSet, HashMap<String, SimShaft>), TrackingError> {
        let mut set = TrackingWheelSet::new();
        let mut shafts = HashMap::new();

        let deadline = self
            .read_deadline
            .map_or_else(ReadDeadline::default, ReadDeadline::new);

        for entry in self.wheels {
            let shaft = SimShaft::new();
            let wheel: Box<dyn TrackingWheel> = match entry.kind {
                SimWheelKind::Encoder {
                    ticks_per_revolution,
                } => Box::new(EncoderWheel::with_read_deadline(
                    entry.id.clone(),
                    SimEncoder::new(shaft.clone(), f64::from(ticks_per_revolution)),
                    entry.calibration,
                    ticks_per_revolution,
                    deadline,
                )?),
                SimWheelKind::Rotation => Box::new(RotationWheel::with_read_deadline(
                    entry.id.clone(),
                    SimRotationSensor::new(shaft.clone()),
                    entry.calibration,
                    deadline,
                )?),
                SimWheelKind::Motor => Box::new(MotorWheel::with_read_deadline(
                    entry.id.clone(),
                    SimMotor::new(shaft.clone()),
                    entry.calibration,
                    deadline,
                )?),
            };
            set.register(wheel);
            shafts.insert(entry.id, shaft);
        }

        Ok((set, shafts))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
