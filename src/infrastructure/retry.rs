//! Bounded retry policy with exponential backoff and jitter.

use std::time::Duration;

const DEFAULT_MAX_RETRIES: u32 = 3;
const BASE_DELAY: Duration = Duration::from_millis(500);
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Backoff schedule for retryable fetch failures. Retries are bounded; the
/// caller gives up and surfaces the last error once the budget is spent.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: BASE_DELAY,
            max_delay: MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry `attempt` (1-based): the base delay doubled per
    /// attempt, plus up to 50% jitter, capped at `max_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let exponential = self.base_delay.saturating_mul(1 << exponent);
        let jitter = exponential.mul_f64(fastrand::f64() * 0.5);
        exponential.saturating_add(jitter).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_per_attempt() {
        let policy = RetryPolicy::default();
        assert!(policy.backoff(1) >= Duration::from_millis(500));
        assert!(policy.backoff(1) < Duration::from_millis(750) + Duration::from_millis(1));
        assert!(policy.backoff(2) >= Duration::from_secs(1));
        assert!(policy.backoff(3) >= Duration::from_secs(2));
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy::default();
        for attempt in 1..64 {
            assert!(policy.backoff(attempt) <= Duration::from_secs(30));
        }
    }
}
