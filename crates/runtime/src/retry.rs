//! Activity retry policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Exponential-backoff retry policy applied to activity invocations.
///
/// Enforced by the execution substrate, independent of any
/// domain-level timeout the workflow itself arms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_coefficient: f64,
    /// Upper bound on the delay between attempts.
    pub max_interval: Duration,
    /// Total attempts, the first one included. Must be at least 1.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            backoff_coefficient: 2.0,
            max_interval: Duration::from_secs(100),
            max_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Returns the backoff delay after the given failed attempt
    /// (1-based), capped at `max_interval`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let delay = self.initial_interval.as_secs_f64() * self.backoff_coefficient.powi(exponent);
        Duration::from_secs_f64(delay.min(self.max_interval.as_secs_f64()))
    }
}
