//! [`ReadDeadline`] – bounded latency for raw sensor transactions.
//!
//! A synchronous driver call cannot be pre-empted, so the deadline works after
//! the fact: the call is timed and a reading that arrives later than the limit
//! is dropped and reported as [`SensorFault::Timeout`].  The odometry loop then
//! sees "no new information" for that wheel instead of a value sampled at an
//! unknown point in the past.

use std::time::{Duration, Instant};

use odotrack_types::SensorFault;

/// One odometry cycle.
pub const DEFAULT_READ_DEADLINE: Duration = Duration::from_millis(10);

/// Whole milliseconds, rounded up so a late read never reports as on time.
fn ceil_millis(d: Duration) -> u64 {
    d.as_micros().div_ceil(1000) as u64
}

/// Maximum wall-clock time a single raw sensor read may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadDeadline {
    limit: Duration,
}

impl Default for ReadDeadline {
    fn default() -> Self {
        Self::new(DEFAULT_READ_DEADLINE)
    }
}

impl ReadDeadline {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Run `read` and enforce the limit on its duration.
    ///
    /// # Errors
    ///
    /// Propagates the driver's own [`SensorFault`], or returns
    /// [`SensorFault::Timeout`] when the read succeeded too late.
    pub fn run<T>(
        &self,
        read: impl FnOnce() -> Result<T, SensorFault>,
    ) -> Result<T, SensorFault> {
        let started = Instant::now();
        let value = read()?;
        let elapsed = started.elapsed();
        if elapsed > self.limit {
            return Err(SensorFault::Timeout {
                elapsed_ms: ceil_millis(elapsed),
                limit_ms: ceil_millis(self.limit),
            });
        }
        Ok(value)
    }
}
