//! [`RotationWheel`] – tracking wheel on an absolute rotational sensor.

use odotrack_types::{SensorFault, TrackingError, WheelCalibration};
use tracing::{debug, warn};

use crate::deadline::ReadDeadline;
use crate::sensor::AbsoluteRotationSensor;
use crate::tracking_wheel::{TrackingWheel, ZeroPoint};

/// A tracking wheel read from a multi-turn rotation sensor.
///
/// `distance = Δdegrees / 360 × gear_ratio × π × diameter`.
pub struct RotationWheel<R> {
    id: String,
    sensor: R,
    calibration: WheelCalibration,
    inches_per_degree: f32,
    deadline: ReadDeadline,
    zero: ZeroPoint<f32>,
}

/// Reject readings that cannot be an angle.
fn finite_degrees(degrees: f32) -> Result<f32, SensorFault> {
    if degrees.is_finite() {
        Ok(degrees)
    } else {
        Err(SensorFault::MalformedReading(format!("angle {degrees} deg")))
    }
}

impl<R: AbsoluteRotationSensor> RotationWheel<R> {
    /// Bind `sensor` to a wheel with the default read deadline.
    ///
    /// # Errors
    ///
    /// See [`with_read_deadline`][Self::with_read_deadline].
    pub fn new(
        id: impl Into<String>,
        sensor: R,
        calibration: WheelCalibration,
    ) -> Result<Self, TrackingError> {
        Self::with_read_deadline(id, sensor, calibration, ReadDeadline::default())
    }

    /// Bind `sensor` to a wheel and anchor the zero point at its current
    /// angle.  `deadline` applies to every read, the one taken here included.
    /// If the sensor cannot be read yet, the zero point is 0°.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::InvalidCalibration`] for non-physical geometry.
    pub fn with_read_deadline(
        id: impl Into<String>,
        mut sensor: R,
        calibration: WheelCalibration,
        deadline: ReadDeadline,
    ) -> Result<Self, TrackingError> {
        let id = id.into();
        calibration.validate(&id)?;

        let origin = deadline
            .run(|| sensor.position_degrees().and_then(finite_degrees))
            .unwrap_or_else(|fault| {
                warn!(wheel = %id, %fault, "rotation sensor unreadable at construction; zero point at 0 deg");
                0.0
            });

        Ok(Self {
            inches_per_degree: calibration.distance_per_sensor_revolution() / 360.0,
            id,
            sensor,
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

    /// Release the sensor binding.
    pub fn into_inner(self) -> R {
        self.sensor
    }

    fn read(&mut self) -> Result<f32, TrackingError> {
        self.deadline
            .run(|| self.sensor.position_degrees().and_then(finite_degrees))
            .map_err(|fault| TrackingError::unavailable(&self.id, fault))
    }
}

impl<R: AbsoluteRotationSensor> TrackingWheel for RotationWheel<R> {
    fn id(&self) -> &str {
        &self.id
    }

    fn reset(&mut self) -> Result<(), TrackingError> {
        let degrees = self.read()?;
        self.zero.rezero(degrees);
        debug!(wheel = %self.id, degrees, "rotation zero point moved");
        Ok(())
    }

    fn distance_traveled(&mut self) -> Result<f32, TrackingError> {
        let degrees = self.read()?;
        Ok((degrees - self.zero.baseline()) * self.inches_per_degree)
    }

    fn offset(&self) -> f32 {
        self.calibration.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimRotationSensor, SimShaft};
    use std::f32::consts::PI;
    use std::time::Duration;

    fn wheel(shaft: &SimShaft) -> RotationWheel<SimRotationSensor> {
        RotationWheel::new(
            "vertical",
            SimRotationSensor::new(shaft.clone()),
            WheelCalibration::new(2.75, 0.5),
        )
        .unwrap()
    }

    #[test]
    fn one_revolution_scenario() {
        let shaft = SimShaft::new();
        let mut w = wheel(&shaft);
        assert!((w.offset() - 0.5).abs() < f32::EPSILON);
        shaft.rotate(1.0);
        assert!((w.distance_traveled().unwrap() - 8.639).abs() < 1e-3);
        assert!((w.offset() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn reset_redefines_zero_not_cumulative() {
        let shaft = SimShaft::new();
        let mut w = wheel(&shaft);
        shaft.rotate(0.5);
        w.reset().unwrap();
        assert!(w.is_calibrated());
        shaft.rotate(0.25);
        let d = w.distance_traveled().unwrap();
        assert!((d - 2.160).abs() < 1e-3);
        assert!((d - PI * 2.75 * 0.75).abs() > 1.0);
    }

    #[test]
    fn reset_twice_is_idempotent() {
        let shaft = SimShaft::new();
        let mut once = wheel(&shaft);
        let mut twice = wheel(&shaft);
        shaft.rotate(1.3);
        once.reset().unwrap();
        twice.reset().unwrap();
        twice.reset().unwrap();
        assert_eq!(once.distance_traveled().unwrap(), 0.0);
        assert_eq!(twice.distance_traveled().unwrap(), 0.0);

        shaft.rotate(-0.4);
        let a = once.distance_traveled().unwrap();
        let b = twice.distance_traveled().unwrap();
        assert_eq!(a, b);
        assert!(a < 0.0);
    }

    #[test]
    fn equal_rotations_give_equal_deltas_across_resets() {
        let shaft = SimShaft::new();
        let mut w = wheel(&shaft);

        let start = w.distance_traveled().unwrap();
        shaft.rotate(0.2);
        let first = w.distance_traveled().unwrap() - start;

        w.reset().unwrap();
        w.reset().unwrap();
        let start = w.distance_traveled().unwrap();
        shaft.rotate(0.2);
        let second = w.distance_traveled().unwrap() - start;

        assert!((first - second).abs() < 1e-4);
        assert!((first - PI * 2.75 * 0.2).abs() < 1e-3);
    }

    #[test]
    fn nan_angle_is_malformed() {
        let shaft = SimShaft::new();
        let mut w = wheel(&shaft);
        shaft.rotate(1.0);
        shaft.set_malformed(true);
        assert!(matches!(
            w.reset(),
            Err(TrackingError::SensorUnavailable {
                fault: SensorFault::MalformedReading(_),
                ..
            })
        ));

        // The failed reset must not have moved the zero point.
        shaft.set_malformed(false);
        assert!((w.distance_traveled().unwrap() - PI * 2.75).abs() < 1e-3);
    }

    #[test]
    fn disconnected_sensor_surfaces_unavailable() {
        let shaft = SimShaft::new();
        let mut w = wheel(&shaft);
        shaft.disconnect();
        assert!(w.distance_traveled().unwrap_err().is_sensor_unavailable());
        assert!(w.reset().unwrap_err().is_sensor_unavailable());
        assert!((w.offset() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn construction_read_honours_configured_deadline() {
        let shaft = SimShaft::new();
        shaft.rotate(2.5);
        shaft.set_latency(Duration::from_millis(20));
        let mut w = RotationWheel::with_read_deadline(
            "vertical",
            SimRotationSensor::new(shaft.clone()),
            WheelCalibration::new(2.75, 0.5),
            ReadDeadline::new(Duration::from_millis(200)),
        )
        .unwrap();
        assert_eq!(w.distance_traveled().unwrap(), 0.0);
    }
}
