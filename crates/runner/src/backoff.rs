//! Reconnect delay calculation
//!
//! `delay(attempt) = floor(min(initial * multiplier^attempt, max) * j)` where
//! `j` is drawn uniformly from `[1.0, 1.25)` when jitter is enabled and is
//! `1.0` otherwise. The attempt counter is owned by the caller; the
//! connection manager resets it to 0 on every successful connection.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RunnerError};

/// Upper end (exclusive) of the jitter factor
pub const MAX_JITTER_FACTOR: f64 = 1.25;

/// Backoff parameters, loaded from the `[backoff]` table of the runner config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the first retry, in milliseconds (default: 1000)
    pub initial_delay_ms: u64,
    /// Cap on the un-jittered delay, in milliseconds (default: 30000)
    pub max_delay_ms: u64,
    /// Growth factor per attempt (default: 2.0)
    pub multiplier: f64,
    /// Spread delays by up to 25% (default: true)
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig {
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl BackoffConfig {
    /// Same parameters with jitter disabled
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Check the parameters describe a non-decreasing, bounded schedule
    pub fn validate(&self) -> Result<()> {
        if self.initial_delay_ms == 0 {
            return Err(RunnerError::Config(
                "backoff.initial_delay_ms must be greater than zero".into(),
            ));
        }
        if self.multiplier.is_nan() || self.multiplier < 1.0 {
            return Err(RunnerError::Config(format!(
                "backoff.multiplier must be at least 1.0, got {}",
                self.multiplier
            )));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(RunnerError::Config(format!(
                "backoff.initial_delay_ms ({}) exceeds backoff.max_delay_ms ({})",
                self.initial_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }

    /// Un-jittered delay in milliseconds for `attempt`
    pub fn base_delay_ms(&self, attempt: u32) -> f64 {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let grown = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        grown.min(self.max_delay_ms as f64)
    }

    /// Delay before reconnect attempt `attempt`, using the thread-local RNG
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with_rng(attempt, &mut rand::thread_rng())
    }

    /// Delay before reconnect attempt `attempt`, drawing jitter from `rng`
    pub fn delay_with_rng<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base = self.base_delay_ms(attempt);
        let factor = if self.jitter {
            rng.gen_range(1.0..MAX_JITTER_FACTOR)
        } else {
            1.0
        };
        Duration::from_millis((base * factor).floor() as u64)
    }
}
