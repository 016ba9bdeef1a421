//! Generic `TrackingWheel` trait: the contract between wheel sensors and the
//! odometry engine.
//!
//! A tracking wheel is a free-spinning wheel whose rotation is measured only
//! to infer how far the chassis has travelled.  Concrete adapters
//! ([`EncoderWheel`][crate::encoder::EncoderWheel],
//! [`RotationWheel`][crate::rotation::RotationWheel],
//! [`MotorWheel`][crate::motor::MotorWheel]) wrap a raw driver and its
//! calibration; odometry code only ever talks to this trait, so sensors can be
//! swapped without touching the localization math.

use odotrack_types::TrackingError;

/// A resettable, unit-correct distance measurement for one physical wheel.
///
/// Distances and the offset are in inches.  Positive distance is forward
/// motion in the wheel's rolling direction.
pub trait TrackingWheel: Send {
    /// Stable identifier for this wheel, e.g. `"vertical"` or `"horizontal"`.
    fn id(&self) -> &str;

    /// Move the zero point to the wheel's current position.
    ///
    /// Calling it twice with no motion in between leaves the zero point where
    /// the first call put it.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::SensorUnavailable`] if the sensor cannot be
    /// read; the previous zero point is kept.
    fn reset(&mut self) -> Result<(), TrackingError>;

    /// Net signed distance travelled since the last successful
    /// [`reset`][Self::reset], or since construction if never reset.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::SensorUnavailable`] if the sensor cannot be
    /// read.  Callers must treat this as "no new information", not as zero
    /// motion.
    fn distance_traveled(&mut self) -> Result<f32, TrackingError>;

    /// Distance from the robot's center of rotation, fixed at construction.
    fn offset(&self) -> f32;
}

/// Software zero point of a raw sensor reading.
///
/// The baseline only moves on [`rezero`][Self::rezero], which the adapters
/// call after a successful read, so a failed reset never disturbs it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ZeroPoint<R> {
    baseline: R,
    calibrated: bool,
}

impl<R: Copy> ZeroPoint<R> {
    /// Uncalibrated zero point anchored at the reading taken at construction.
    pub(crate) fn at(raw: R) -> Self {
        Self {
            baseline: raw,
            calibrated: false,
        }
    }

    pub(crate) fn rezero(&mut self, raw: R) {
        self.baseline = raw;
        self.calibrated = true;
    }

    pub(crate) fn baseline(&self) -> R {
        self.baseline
    }

    pub(crate) fn is_calibrated(&self) -> bool {
        self.calibrated
    }
}
