//! Retry policy: decides delivery backoff delays.

use std::time::Duration;

/// Exponential backoff between delivery attempts.
///
/// The scheduler retries delivery without a limit either way; this only
/// spaces the attempts out. With no policy configured, a failed callback
/// is re-armed immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay after the first failure.
    pub base_delay: Duration,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,

    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn exponential(base_delay: Duration, multiplier: f64, max_delay: Duration) -> Self {
        Self {
            base_delay,
            multiplier,
            max_delay,
        }
    }

    /// Delay before the next attempt after `failures` consecutive failures.
    ///
    /// delay = base_delay * multiplier^(failures - 1), capped at `max_delay`.
    ///
    /// Example with base_delay=1s, multiplier=2.0, max_delay=10s:
    /// - failure 1: 1s
    /// - failure 2: 2s
    /// - failure 3: 4s
    /// - failure 5: 10s (capped)
    pub fn next_delay(&self, failures: u32) -> Duration {
        let exponent = i32::try_from(failures.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn policy() -> RetryPolicy {
        RetryPolicy::exponential(Duration::from_secs(1), 2.0, Duration::from_secs(10))
    }

    #[rstest]
    #[case::zero_failures(0, 1)]
    #[case::first(1, 1)]
    #[case::second(2, 2)]
    #[case::third(3, 4)]
    #[case::fourth(4, 8)]
    #[case::capped(5, 10)]
    #[case::far_out(200, 10)]
    fn exponential_backoff_is_capped(#[case] failures: u32, #[case] secs: u64) {
        assert_eq!(policy().next_delay(failures), Duration::from_secs(secs));
    }

    #[test]
    fn constant_policy_with_multiplier_one() {
        let p = RetryPolicy::exponential(Duration::from_millis(500), 1.0, Duration::from_secs(60));
        assert_eq!(p.next_delay(1), Duration::from_millis(500));
        assert_eq!(p.next_delay(9), Duration::from_millis(500));
    }
}
