//! Raw sensor driver traits consumed by the tracking-wheel adapters.
//!
//! A driver only has to expose the sensor's native reading; unit conversion,
//! zeroing and error mapping live in the adapters.  Every call must return in
//! bounded time.  The adapters additionally run each call through a
//! [`ReadDeadline`][crate::deadline::ReadDeadline] and discard late readings.

use odotrack_types::SensorFault;

/// An incremental (quadrature or optical shaft) encoder.
pub trait IncrementalEncoder: Send {
    /// Cumulative signed tick count since the driver was opened.
    ///
    /// # Errors
    ///
    /// Returns a [`SensorFault`] if the encoder cannot be read.
    fn ticks(&mut self) -> Result<i32, SensorFault>;
}

/// An absolute rotational sensor that tracks whole turns.
pub trait AbsoluteRotationSensor: Send {
    /// Cumulative (multi-turn) shaft angle in degrees.
    ///
    /// # Errors
    ///
    /// Returns a [`SensorFault`] if the sensor cannot be read.
    fn position_degrees(&mut self) -> Result<f32, SensorFault>;
}

/// The integrated encoder of a drive motor (or motor group).
pub trait MotorEncoder: Send {
    /// Cumulative motor-shaft revolutions.
    ///
    /// # Errors
    ///
    /// Returns a [`SensorFault`] if the motor cannot be read.
    fn position_revolutions(&mut self) -> Result<f32, SensorFault>;
}
