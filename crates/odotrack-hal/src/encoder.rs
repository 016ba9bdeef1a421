//! [`EncoderWheel`] – tracking wheel on an incremental (quadrature) encoder.

use odotrack_types::{TrackingError, WheelCalibration};
use tracing::{debug, warn};

use crate::deadline::ReadDeadline;
use crate::sensor::IncrementalEncoder;
use crate::tracking_wheel::{TrackingWheel, ZeroPoint};

/// A tracking wheel whose rotation is counted in encoder ticks.
///
/// `distance = Δticks / ticks_per_revolution × gear_ratio × π × diameter`.
/// Tick deltas are taken in integer arithmetic, so two equal physical deltas
/// always convert to the same distance.
pub struct EncoderWheel<E> {
    id: String,
    encoder: E,
    calibration: WheelCalibration,
    inches_per_tick: f32,
    deadline: ReadDeadline,
    zero: ZeroPoint<i32>,
}

impl<E: IncrementalEncoder> EncoderWheel<E> {
    /// Bind `encoder` to a wheel with the default read deadline.
    ///
    /// # Errors
    ///
    /// See [`with_read_deadline`][Self::with_read_deadline].
    pub fn new(
        id: impl Into<String>,
        encoder: E,
        calibration: WheelCalibration,
        ticks_per_revolution: f32,
    ) -> Result<Self, TrackingError> {
        Self::with_read_deadline(
            id,
            encoder,
            calibration,
            ticks_per_revolution,
            ReadDeadline::default(),
        )
    }

    /// Bind `encoder` to a wheel and anchor the zero point at its current
    /// count.  `deadline` applies to every read, the one taken here included.
    /// If the encoder cannot be read yet, counting starts from raw zero.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::InvalidCalibration`] for non-physical geometry
    /// or a non-positive encoder resolution.
    pub fn with_read_deadline(
        id: impl Into<String>,
        mut encoder: E,
        calibration: WheelCalibration,
        ticks_per_revolution: f32,
        deadline: ReadDeadline,
    ) -> Result<Self, TrackingError> {
        let id = id.into();
        calibration.validate(&id)?;
        if !(ticks_per_revolution.is_finite() && ticks_per_revolution > 0.0) {
            return Err(TrackingError::InvalidCalibration {
                wheel: id,
                details: format!("ticks per revolution must be positive, got {ticks_per_revolution}"),
            });
        }

        let origin = deadline.run(|| encoder.ticks()).unwrap_or_else(|fault| {
            warn!(wheel = %id, %fault, "encoder unreadable at construction; counting from raw zero");
            0
        });

        Ok(Self {
            inches_per_tick: calibration.distance_per_sensor_revolution() / ticks_per_revolution,
            id,
            encoder,
            calibration,
            deadline,
            zero: ZeroPoint::at(origin),
        })
    }

    pub fn calibration(&self) -> &WheelCalibration {
        &self.calibration
    }

    /// `true` once at least one reset has succeeded.
    pub fn is_calibrated(&self) -> bool {
        self.zero.is_calibrated()
    }

    /// Release the encoder binding.
    pub fn into_inner(self) -> E {
        self.encoder
    }

    fn read(&mut self) -> Result<i32, TrackingError> {
        self.deadline
            .run(|| self.encoder.ticks())
            .map_err(|fault| TrackingError::unavailable(&self.id, fault))
    }
}

impl<E: IncrementalEncoder> TrackingWheel for EncoderWheel<E> {
    fn id(&self) -> &str {
        &self.id
    }

    fn reset(&mut self) -> Result<(), TrackingError> {
        let ticks = self.read()?;
        self.zero.rezero(ticks);
        debug!(wheel = %self.id, ticks, "encoder zero point moved");
        Ok(())
    }

    fn distance_traveled(&mut self) -> Result<f32, TrackingError> {
        let ticks = self.read()?;
        let delta = ticks.wrapping_sub(self.zero.baseline());
        Ok(delta as f32 * self.inches_per_tick)
    }

    fn offset(&self) -> f32 {
        self.calibration.offset
    }
}
