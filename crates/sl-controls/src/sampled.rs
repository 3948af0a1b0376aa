//! Sampled execution primitives.
//!
//! The controller runs once per fixed sample period. The period is chosen at
//! construction and never changes; a zero or negative period would make the
//! derivative undefined, so it is refused up front instead of per tick.

use std::time::Duration;

use sl_core::{Time, ensure_period, seconds};

use crate::error::ControlResult;

/// Sample configuration for a controller or generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleConfig {
    /// Sample period in seconds.
    dt: f64,
    /// Same period for timer APIs.
    duration: Duration,
}

impl SampleConfig {
    /// Create a new sample configuration.
    ///
    /// # Errors
    ///
    /// Fails if `dt` is not a finite, positive number of seconds that a timer
    /// can schedule (at least 1 ns).
    pub fn new(dt: f64) -> ControlResult<Self> {
        let duration = ensure_period(dt, "sample period")?;
        Ok(Self { dt, duration })
    }

    /// Create a sample configuration from a typed period.
    pub fn from_period(period: Time) -> ControlResult<Self> {
        Self::new(seconds(period))
    }

    /// Sample period in seconds.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Sample period for timer APIs. Never zero.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Sample clock tracks when a periodic task is due in simulated time.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleClock {
    /// Sample configuration.
    pub config: SampleConfig,
    /// Time of next scheduled sample.
    pub next_sample_time: f64,
    /// Samples taken so far.
    pub count: u64,
    start_time: f64,
}

impl SampleClock {
    /// Create a new sample clock. The first sample is due one period after
    /// `initial_time`, matching a timer that fires after its first interval.
    pub fn new(config: SampleConfig, initial_time: f64) -> Self {
        Self {
            config,
            next_sample_time: initial_time + config.dt,
            count: 0,
            start_time: initial_time,
        }
    }

    /// Check if a sample should occur at the given time.
    pub fn should_sample(&self, current_time: f64) -> bool {
        // Tolerate accumulated float error so 10 x 0.1 s lands on t = 1.0.
        current_time + 1e-9 * self.config.dt >= self.next_sample_time
    }

    /// Advance to the next sample time.
    ///
    /// The next time is derived from the sample count, not by repeated addition,
    /// so long runs do not drift.
    pub fn advance(&mut self) {
        self.count += 1;
        self.next_sample_time = self.start_time + (self.count + 1) as f64 * self.config.dt;
    }
}

/// Zero-order hold: keeps the last sampled value between samples.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroOrderHold {
    /// Held value.
    pub value: f64,
    /// Sample clock.
    pub clock: SampleClock,
}

impl ZeroOrderHold {
    /// Create a new zero-order hold.
    pub fn new(config: SampleConfig, initial_time: f64, initial_value: f64) -> Self {
        Self {
            value: initial_value,
            clock: SampleClock::new(config, initial_time),
        }
    }

    /// Get the current held value.
    pub fn get(&self) -> f64 {
        self.value
    }

    /// Sample `compute` if the clock is due, otherwise keep holding.
    ///
    /// `compute` is only called on a sample, so side effects in it run exactly
    /// once per period. Returns `true` if the value was updated.
    pub fn update_with(&mut self, current_time: f64, compute: impl FnOnce() -> Option<f64>) -> bool {
        if !self.clock.should_sample(current_time) {
            return false;
        }
        self.clock.advance();
        match compute() {
            Some(value) => {
                self.value = value;
                true
            }
            None => false,
        }
    }
}
