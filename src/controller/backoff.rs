//! # Backoff
//!
//! Retry pacing for the controller.
//!
//! - [`FibonacciBackoff`] drives the requeue delay chosen by the error policy
//!   after a failed reconciliation. Sequence in minutes: 1, 1, 2, 3, 5, 8, 10 (max).
//! - [`CooldownPolicy`] decides how long a reconciliation waits before it
//!   returns a publish failure, and before it retries a delete that failed
//!   last time. The default is a fixed 60 second cooldown.
//!
//! ```rust
//! use pushsecret_controller::controller::backoff::FibonacciBackoff;
//!
//! let mut backoff = FibonacciBackoff::new(1, 10);
//! assert_eq!(backoff.next_backoff_seconds(), 60);
//! assert_eq!(backoff.next_backoff_seconds(), 60);
//! assert_eq!(backoff.next_backoff_seconds(), 120);
//! ```

use crate::constants::{FAILURE_COOLDOWN_SECS, MAX_COOLDOWN_SECS};
use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Calculations are performed in whole minutes and returned in seconds.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_minutes: u64,
    prev_minutes: u64,
    current_minutes: u64,
    max_minutes: u64,
}

impl FibonacciBackoff {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes,
            max_minutes,
        }
    }

    /// Current backoff in seconds, advancing the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result_seconds = self.current_minutes * 60;
        let next_minutes = self.prev_minutes + self.current_minutes;
        self.prev_minutes = self.current_minutes;
        self.current_minutes = std::cmp::min(next_minutes, self.max_minutes);
        result_seconds
    }

    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    /// Restart the sequence after a success
    pub fn reset(&mut self) {
        self.prev_minutes = 0;
        self.current_minutes = self.min_minutes;
    }
}

/// Wait applied before surfacing or retrying a failed remote operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownPolicy {
    /// Same delay after every failure
    Fixed(Duration),
    /// `base * 2^(n-1)`, capped at `max`
    Exponential { base: Duration, max: Duration },
    /// `base * fib(n)` (1, 1, 2, 3, 5, ...), capped at `max`
    Fibonacci { base: Duration, max: Duration },
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        CooldownPolicy::Fixed(Duration::from_secs(FAILURE_COOLDOWN_SECS))
    }
}

impl CooldownPolicy {
    /// Cooldown after `consecutive_failures` failures of the same resource
    ///
    /// Zero is treated as one so the first failure always waits the base delay.
    #[must_use]
    pub fn cooldown(&self, consecutive_failures: u32) -> Duration {
        let n = consecutive_failures.max(1);
        match *self {
            CooldownPolicy::Fixed(delay) => delay,
            CooldownPolicy::Exponential { base, max } => {
                let factor = 2u32.checked_pow(n - 1).unwrap_or(u32::MAX);
                base.checked_mul(factor).map_or(max, |d| d.min(max))
            }
            CooldownPolicy::Fibonacci { base, max } => {
                let (mut prev, mut current) = (0u32, 1u32);
                for _ in 1..n {
                    let next = prev.saturating_add(current);
                    prev = current;
                    current = next;
                }
                base.checked_mul(current).map_or(max, |d| d.min(max))
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            CooldownPolicy::Fixed(_) => "fixed",
            CooldownPolicy::Exponential { .. } => "exponential",
            CooldownPolicy::Fibonacci { .. } => "fibonacci",
        }
    }
}

impl std::str::FromStr for CooldownPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let base = Duration::from_secs(FAILURE_COOLDOWN_SECS);
        let max = Duration::from_secs(MAX_COOLDOWN_SECS);
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(CooldownPolicy::Fixed(base)),
            "exponential" => Ok(CooldownPolicy::Exponential { base, max }),
            "fibonacci" => Ok(CooldownPolicy::Fibonacci { base, max }),
            other => Err(format!(
                "unknown cooldown policy '{other}', expected 'fixed', 'exponential' or 'fibonacci'"
            )),
        }
    }
}
