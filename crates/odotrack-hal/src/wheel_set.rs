//! [`TrackingWheelSet`] – the odometry engine's exclusive ownership of its
//! tracking wheels.
//!
//! Each wheel is held as a `Box<dyn TrackingWheel>` for the lifetime of the
//! chassis session; no two entries share a sensor.  Wheels keep their
//! registration order, so an engine that samples every cycle sees them in a
//! stable order.
//!
//! # Calibration
//!
//! [`TrackingWheelSet::calibrate`] resets every wheel once at startup.  A
//! failing wheel does not stop the others from being zeroed; the first error
//! is returned after all wheels have been tried.

use chrono::Utc;
use odotrack_types::{TrackingError, WheelSample};
use tracing::{info, warn};

use crate::tracking_wheel::TrackingWheel;

/// Owned collection of tracking wheels, keyed by [`TrackingWheel::id`].
#[derive(Default)]
pub struct TrackingWheelSet {
    wheels: Vec<Box<dyn TrackingWheel>>,
}

impl TrackingWheelSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a wheel.  A previously registered wheel with the same `id` is
    /// replaced in place and dropped.
    pub fn register(&mut self, wheel: Box<dyn TrackingWheel>) {
        match self.position(wheel.id()) {
            Some(idx) => self.wheels[idx] = wheel,
            None => self.wheels.push(wheel),
        }
    }

    /// Remove a wheel and hand back ownership of it.
    pub fn remove(&mut self, id: &str) -> Option<Box<dyn TrackingWheel>> {
        self.position(id).map(|idx| self.wheels.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.wheels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wheels.is_empty()
    }

    /// Wheel identifiers in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.wheels.iter().map(|w| w.id()).collect()
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut (dyn TrackingWheel + 'static)> {
        let idx = self.position(id)?;
        Some(self.wheels[idx].as_mut())
    }

    /// Mounting offset of `id`, if registered.
    pub fn offset(&self, id: &str) -> Option<f32> {
        self.wheels.iter().find(|w| w.id() == id).map(|w| w.offset())
    }

    /// Reset a single wheel.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::UnknownWheel`] if `id` is not registered, or
    /// the wheel's own [`TrackingError::SensorUnavailable`].
    pub fn reset(&mut self, id: &str) -> Result<(), TrackingError> {
        self.wheel_mut(id)?.reset()
    }

    /// Reset every wheel.
    ///
    /// # Errors
    ///
    /// Returns the first [`TrackingError`] encountered, after every wheel has
    /// been attempted.
    pub fn calibrate(&mut self) -> Result<(), TrackingError> {
        let mut first_error = None;
        for wheel in &mut self.wheels {
            if let Err(e) = wheel.reset() {
                warn!(wheel = %wheel.id(), error = %e, "tracking wheel failed to calibrate");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                info!(wheels = self.wheels.len(), "tracking wheels calibrated");
                Ok(())
            }
        }
    }

    /// Read one wheel.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::UnknownWheel`] if `id` is not registered.
    /// Sensor failures are carried inside the returned sample.
    pub fn sample(&mut self, id: &str) -> Result<WheelSample, TrackingError> {
        Ok(sample_wheel(self.wheel_mut(id)?))
    }

    /// Read every wheel, in registration order.
    pub fn sample_all(&mut self) -> Vec<WheelSample> {
        self.wheels
            .iter_mut()
            .map(|w| sample_wheel(w.as_mut()))
            .collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.wheels.iter().position(|w| w.id() == id)
    }

    fn wheel_mut(&mut self, id: &str) -> Result<&mut dyn TrackingWheel, TrackingError> {
        match self.position(id) {
            Some(idx) => Ok(self.wheels[idx].as_mut()),
            None => Err(TrackingError::UnknownWheel(id.to_string())),
        }
    }
}

fn sample_wheel(wheel: &mut dyn TrackingWheel) -> WheelSample {
    let distance = wheel.distance_traveled();
    if let Err(e) = &distance {
        warn!(wheel = %wheel.id(), error = %e, "no distance this cycle");
    }
    WheelSample {
        wheel_id: wheel.id().to_string(),
        offset: wheel.offset(),
        distance,
        sampled_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odotrack_types::SensorFault;

    // ------------------------------------------------------------------
    // Test double
    // ------------------------------------------------------------------

    struct MockWheel {
        id: String,
        offset: f32,
        travelled: f32,
        zero: f32,
        online: bool,
    }

    impl MockWheel {
        fn new(id: &str, offset: f32) -> Box<Self> {
            Box::new(Self {
                id: id.to_string(),
                offset,
                travelled: 0.0,
                zero: 0.0,
                online: true,
            })
        }

        fn offline(id: &str) -> Box<Self> {
            let mut wheel = Self::new(id, 0.0);
            wheel.online = false;
            wheel
        }

        fn check(&self) -> Result<(), TrackingError> {
            if self.online {
                Ok(())
            } else {
                Err(TrackingError::unavailable(&self.id, SensorFault::Disconnected))
            }
        }
    }

    impl TrackingWheel for MockWheel {
        fn id(&self) -> &str {
            &self.id
        }
        fn reset(&mut self) -> Result<(), TrackingError> {
            self.check()?;
            self.zero = self.travelled;
            Ok(())
        }
        fn distance_traveled(&mut self) -> Result<f32, TrackingError> {
            self.check()?;
            Ok(self.travelled - self.zero)
        }
        fn offset(&self) -> f32 {
            self.offset
        }
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    #[test]
    fn register_keeps_order_and_replaces_same_id() {
        let mut set = TrackingWheelSet::new();
        assert!(set.is_empty());
        set.register(MockWheel::new("vertical", 0.5));
        set.register(MockWheel::new("horizontal", -2.0));
        set.register(MockWheel::new("vertical", 1.0));

        assert_eq!(set.len(), 2);
        assert_eq!(set.ids(), vec!["vertical", "horizontal"]);
        assert_eq!(set.offset("vertical"), Some(1.0));
        assert_eq!(set.offset("ghost"), None);
    }

    #[test]
    fn remove_returns_ownership() {
        let mut set = TrackingWheelSet::new();
        set.register(MockWheel::new("vertical", 0.5));
        let wheel = set.remove("vertical").unwrap();
        assert_eq!(wheel.id(), "vertical");
        assert!(set.is_empty());
        assert!(set.remove("vertical").is_none());
    }

    #[test]
    fn sample_all_reports_each_wheel() {
        let mut set = TrackingWheelSet::new();
        set.register(MockWheel::new("vertical", 0.5));
        set.register(MockWheel::offline("horizontal"));

        let samples = set.sample_all();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].wheel_id, "vertical");
        assert_eq!(samples[0].distance(), Some(0.0));
        assert!((samples[0].offset - 0.5).abs() < f32::EPSILON);
        assert_eq!(samples[1].distance(), None);
        assert!(matches!(
            samples[1].distance,
            Err(TrackingError::SensorUnavailable { .. })
        ));
    }

    #[test]
    fn calibrate_tries_every_wheel_and_returns_first_error() {
        let mut set = TrackingWheelSet::new();
        set.register(MockWheel::new("vertical", 0.5));
        set.register(MockWheel::offline("horizontal"));
        set.register(MockWheel::new("back", 3.0));

        for id in ["vertical", "back"] {
            let wheel = set.get_mut(id).unwrap();
            wheel.distance_traveled().unwrap();
        }

        let err = set.calibrate().unwrap_err();
        assert!(matches!(
            err,
            TrackingError::SensorUnavailable { ref wheel, .. } if wheel == "horizontal"
        ));
        assert_eq!(set.sample("back").unwrap().distance(), Some(0.0));
    }

    #[test]
    fn calibrate_all_healthy_succeeds() {
        let mut set = TrackingWheelSet::new();
        set.register(MockWheel::new("vertical", 0.5));
        set.register(MockWheel::new("horizontal", -1.0));
        set.calibrate().unwrap();
        set.reset("vertical").unwrap();
    }

    #[test]
    fn unknown_wheel_returns_error() {
        let mut set = TrackingWheelSet::new();
        assert!(matches!(
            set.reset("ghost"),
            Err(TrackingError::UnknownWheel(_))
        ));
        assert!(matches!(
            set.sample("ghost"),
            Err(TrackingError::UnknownWheel(_))
        ));
        assert!(set.get_mut("ghost").is_none());
    }
}
