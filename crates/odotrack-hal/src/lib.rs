//! `odotrack-hal` – Tracking Wheel Abstraction
//!
//! The boundary between a robot's distance-measuring hardware and the
//! odometry engine that turns wheel travel into a pose estimate.  Odometry
//! code holds a [`TrackingWheelSet`] and only ever talks to the
//! [`TrackingWheel`] trait; which sensor sits behind each wheel is decided
//! once, at construction.
//!
//! # Modules
//!
//! - [`tracking_wheel`] – [`TrackingWheel`]: `reset`, `distance_traveled`,
//!   `offset`.
//! - [`sensor`] – raw driver traits the adapters consume
//!   ([`IncrementalEncoder`], [`AbsoluteRotationSensor`], [`MotorEncoder`]).
//! - [`encoder`], [`rotation`], [`motor`] – one adapter per sensor family,
//!   each converting raw rotation to inches with its fixed
//!   [`WheelCalibration`][odotrack_types::WheelCalibration].
//! - [`deadline`] – [`ReadDeadline`]: drops sensor readings that arrive too
//!   late to be trusted.
//! - [`wheel_set`] – [`TrackingWheelSet`]: exclusive ownership of every wheel,
//!   chassis calibration and per-cycle sampling.
//! - [`config`] – [`ChassisConfig`][config::ChassisConfig]: TOML description
//!   of the chassis' wheels.
//! - [`sim`] – simulated shafts and drivers for running without hardware.
//! - `telemetry` (cargo feature `telemetry`) – `init_tracing`: console
//!   logging setup for the binary that embeds this crate.

pub mod config;
pub mod deadline;
pub mod encoder;
pub mod motor;
pub mod rotation;
pub mod sensor;
pub mod sim;
#[cfg(feature = "telemetry")]
pub mod telemetry;
pub mod tracking_wheel;
pub mod wheel_set;

pub use deadline::{ReadDeadline, DEFAULT_READ_DEADLINE};
pub use encoder::EncoderWheel;
pub use motor::MotorWheel;
pub use rotation::RotationWheel;
pub use sensor::{AbsoluteRotationSensor, IncrementalEncoder, MotorEncoder};
pub use tracking_wheel::TrackingWheel;
pub use wheel_set::TrackingWheelSet;
