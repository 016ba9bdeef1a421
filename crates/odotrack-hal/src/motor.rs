//! [`MotorWheel`] – distance from a drive motor's integrated encoder.
//!
//! Strictly speaking a powered wheel is not a tracking wheel, but odometry
//! without dedicated tracking wheels falls back to the drive motors.  The
//! motor-to-wheel gearing goes into
//! [`WheelCalibration::gear_ratio`][odotrack_types::WheelCalibration]: a
//! 600 rpm motor geared down to a 450 rpm wheel uses `0.75`.

use odotrack_types::{SensorFault, TrackingError, WheelCalibration};
use tracing::{debug, warn};

use crate::deadline::ReadDeadline;
use crate::sensor::MotorEncoder;
use crate::tracking_wheel::{TrackingWheel, ZeroPoint};

pub struct MotorWheel<M> {
    id: String,
    motor: M,
    calibration: WheelCalibration,
    inches_per_revolution: f32,
    deadline: ReadDeadline,
    zero: ZeroPoint<f32>,
}

fn finite_revolutions(revolutions: f32) -> Result<f32, SensorFault> {
    if revolutions.is_finite() {
        Ok(revolutions)
    } else {
        Err(SensorFault::MalformedReading(format!("{revolutions} rev")))
    }
}

impl<M: MotorEncoder> MotorWheel<M> {
    /// Bind `motor` to a wheel with the default read deadline.
    ///
    /// # Errors
    ///
    /// See [`with_read_deadline`][Self::with_read_deadline].
    pub fn new(
        id: impl Into<String>,
        motor: M,
        calibration: WheelCalibration,
    ) -> Result<Self, TrackingError> {
        Self::with_read_deadline(id, motor, calibration, ReadDeadline::default())
    }

    /// `deadline` applies to every read, including the one that anchors the
    /// zero point here.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::InvalidCalibration`] for non-physical geometry.
    pub fn with_read_deadline(
        id: impl Into<String>,
        mut motor: M,
        calibration: WheelCalibration,
        deadline: ReadDeadline,
    ) -> Result<Self, TrackingError> {
        let id = id.into();
        calibration.validate(&id)?;

        let origin = deadline
            .run(|| motor.position_revolutions().and_then(finite_revolutions))
            .unwrap_or_else(|fault| {
                warn!(wheel = %id, %fault, "motor encoder unreadable at construction; zero point at 0 rev");
                0.0
            });

        Ok(Self {
            inches_per_revolution: calibration.distance_per_sensor_revolution(),
            id,
            motor,
            calibration,
            deadline,
            zero: ZeroPoint::at(origin),
        })
    }

    pub fn calibration(&self) -> &WheelCalibration {
        &self.calibration
    }

    pub fn is_calibrated(&self) -> bool {
        self.zero.is_calibrated()
    }

    pub fn into_inner(self) -> M {
        self.motor
    }

    fn read(&mut self) -> Result<f32, TrackingError> {
        self.deadline
            .run(|| self.motor.position_revolutions().and_then(finite_revolutions))
            .map_err(|fault| TrackingError::unavailable(&self.id, fault))
    }
}

impl<M: MotorEncoder> TrackingWheel for MotorWheel<M> {
    fn id(&self) -> &str {
        &self.id
    }

    fn reset(&mut self) -> Result<(), TrackingError> {
        let revolutions = self.read()?;
        self.zero.rezero(revolutions);
        debug!(wheel = %self.id, revolutions, "motor zero point moved");
        Ok(())
    }

    fn distance_traveled(&mut self) -> Result<f32, TrackingError> {
        let revolutions = self.read()?;
        Ok((revolutions - self.zero.baseline()) * self.inches_per_revolution)
    }

    fn offset(&self) -> f32 {
        self.calibration.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimMotor, SimShaft};
    use std::f32::consts::PI;
    use std::time::Duration;

    #[test]
    fn geared_motor_scales_distance() {
        let shaft = SimShaft::new();
        let mut w = MotorWheel::new(
            "left_drive",
            SimMotor::new(shaft.clone()),
            WheelCalibration::new(3.25, -5.5).with_gear_ratio(450.0 / 600.0),
        )
        .unwrap();

        shaft.rotate(4.0);
        let expected = 4.0 * 0.75 * PI * 3.25;
        assert!((w.distance_traveled().unwrap() - expected).abs() < 1e-3);
        assert!((w.offset() + 5.5).abs() < f32::EPSILON);
    }

    #[test]
    fn reset_then_reverse_travel_is_negative() {
        let shaft = SimShaft::new();
        let mut w = MotorWheel::new(
            "right_drive",
            SimMotor::new(shaft.clone()),
            WheelCalibration::new(3.25, 5.5),
        )
        .unwrap();
        shaft.rotate(2.0);
        w.reset().unwrap();
        assert_eq!(w.distance_traveled().unwrap(), 0.0);

        shaft.rotate(-0.5);
        assert!((w.distance_traveled().unwrap() + 0.5 * PI * 3.25).abs() < 1e-3);
    }

    #[test]
    fn infinite_reading_is_malformed() {
        let shaft = SimShaft::new();
        let mut w = MotorWheel::new(
            "left_drive",
            SimMotor::new(shaft.clone()),
            WheelCalibration::new(3.25, 0.0),
        )
        .unwrap();
        shaft.set_malformed(true);
        assert!(matches!(
            w.distance_traveled(),
            Err(TrackingError::SensorUnavailable {
                fault: SensorFault::MalformedReading(_),
                ..
            })
        ));
    }

    #[test]
    fn disconnected_motor_surfaces_unavailable() {
        let shaft = SimShaft::new();
        let mut w = MotorWheel::new(
            "left_drive",
            SimMotor::new(shaft.clone()),
            WheelCalibration::new(3.25, -5.5),
        )
        .unwrap();
        shaft.rotate(1.0);
        shaft.disconnect();

        assert!(matches!(
            w.distance_traveled(),
            Err(TrackingError::SensorUnavailable {
                fault: SensorFault::Disconnected,
                ..
            })
        ));
        assert!(w.reset().unwrap_err().is_sensor_unavailable());
        assert!(!w.is_calibrated());
        assert!((w.offset() + 5.5).abs() < f32::EPSILON);

        // The failed reset left the construction zero point in place.
        shaft.reconnect();
        assert!((w.distance_traveled().unwrap() - PI * 3.25).abs() < 1e-3);
    }

    #[test]
    fn construction_read_honours_configured_deadline() {
        let shaft = SimShaft::new();
        shaft.rotate(3.0);
        shaft.set_latency(Duration::from_millis(20));
        let mut w = MotorWheel::with_read_deadline(
            "left_drive",
            SimMotor::new(shaft.clone()),
            WheelCalibration::new(3.25, 0.0),
            ReadDeadline::new(Duration::from_millis(200)),
        )
        .unwrap();
        assert_eq!(w.distance_traveled().unwrap(), 0.0);
    }

    #[test]
    fn rejects_negative_gear_ratio() {
        let result = MotorWheel::new(
            "left_drive",
            SimMotor::new(SimShaft::new()),
            WheelCalibration::new(3.25, 0.0).with_gear_ratio(-1.0),
        );
        assert!(matches!(result, Err(TrackingError::InvalidCalibration { .. })));
    }
}
