//! Retry policy with exponential backoff
//!
//! Attempt `n` (0-based) that fails transiently is followed by a sleep of
//! `backoff_factor * 2^n` before attempt `n + 1`. There is no jitter and no
//! delay cap: the attempt budget bounds the total wait.
//!
//! Client-input failures (400, 401, 403, 404) are raised on the attempt that
//! produced them. Every other failure is retried while the budget lasts. Once
//! it is spent, transient failures are wrapped in a `RetryExhausted` error
//! (unless no retries were configured at all), while unmapped HTTP statuses
//! are raised as they are.

use std::time::Duration;

use crate::http::error::{ClassifiedError, ErrorKind};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `max_retries + 1` attempts in total
    pub max_retries: u32,
    /// Base delay; attempt `n` waits `backoff_factor * 2^n`
    pub backoff_factor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_factor: Duration::from_millis(10),
        }
    }
}

/// Decision after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep `delay`, then make the next attempt
    Retry { delay: Duration },
    /// Raise the classified error unchanged
    Raise,
    /// Raise a `RetryExhausted` error wrapping the classified error
    Exhausted,
}

/// What happened on one attempt of the loop
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptOutcome {
    /// 0-based attempt index
    pub attempt: u32,
    /// HTTP status, absent for transport-level failures
    pub status: Option<u16>,
    /// Classified failure, absent on success
    pub error: Option<ClassifiedError>,
    pub elapsed: Duration,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(max_retries: u32, backoff_factor: Duration) -> Self {
        Self {
            max_retries,
            backoff_factor,
        }
    }

    /// Total number of attempts the policy allows
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to sleep after failed attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .map_or(Duration::MAX, |multiplier| self.backoff_factor.saturating_mul(multiplier))
    }

    /// All delays the policy can produce, in order
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_retries).map(|n| self.delay_for(n)).collect()
    }

    /// Decide what follows a failure of kind `kind` on attempt `attempt`
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if kind.is_client_input() {
            return RetryDecision::Raise;
        }

        if attempt < self.max_retries {
            return RetryDecision::Retry {
                delay: self.delay_for(attempt),
            };
        }

        if self.max_retries > 0 && kind.is_transient() {
            RetryDecision::Exhausted
        } else {
            RetryDecision::Raise
        }
    }

    /// Build the error raised for a terminal decision
    pub fn terminal_error(&self, decision: RetryDecision, last: ClassifiedError, url: &str) -> ClassifiedError {
        match decision {
            RetryDecision::Exhausted => ClassifiedError::retry_exhausted(last, self.max_retries, url),
            RetryDecision::Raise | RetryDecision::Retry { .. } => last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(100))
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.backoff_factor, Duration::from_millis(10));
    }

    #[test]
    fn test_exponential_schedule() {
        assert_eq!(
            policy(4).schedule(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
            ]
        );
        assert!(policy(0).schedule().is_empty());
    }

    #[test]
    fn test_client_input_never_retried() {
        let policy = policy(5);
        for kind in [ErrorKind::BadRequest, ErrorKind::Authentication, ErrorKind::NotFound] {
            assert_eq!(policy.decide(0, kind), RetryDecision::Raise);
        }
    }

    #[test]
    fn test_transient_retried_then_exhausted() {
        let policy = policy(2);
        assert_eq!(
            policy.decide(0, ErrorKind::ServerError),
            RetryDecision::Retry { delay: Duration::from_millis(100) }
        );
        assert_eq!(
            policy.decide(1, ErrorKind::Timeout),
            RetryDecision::Retry { delay: Duration::from_millis(200) }
        );
        assert_eq!(policy.decide(2, ErrorKind::RateLimit), RetryDecision::Exhausted);
        assert_eq!(policy.decide(2, ErrorKind::GenericClient), RetryDecision::Exhausted);
    }

    #[test]
    fn test_no_budget_raises_raw() {
        let policy = policy(0);
        for kind in [
            ErrorKind::ServerError,
            ErrorKind::RateLimit,
            ErrorKind::Timeout,
            ErrorKind::ConnectionFailure,
            ErrorKind::GenericClient,
        ] {
            assert_eq!(policy.decide(0, kind), RetryDecision::Raise);
        }
    }

    #[test]
    fn test_unmapped_status_retried_then_raised_raw() {
        let policy = policy(1);
        assert!(matches!(policy.decide(0, ErrorKind::GenericApi), RetryDecision::Retry { .. }));
        assert_eq!(policy.decide(1, ErrorKind::GenericApi), RetryDecision::Raise);
    }

    #[test]
    fn test_terminal_error() {
        let policy = policy(3);
        let last = ClassifiedError::new(ErrorKind::ConnectionFailure, "Connection error");

        let raised = policy.terminal_error(RetryDecision::Raise, last.clone(), "u");
        assert_eq!(raised, last);

        let wrapped = policy.terminal_error(RetryDecision::Exhausted, last.clone(), "u");
        assert_eq!(wrapped.kind, ErrorKind::RetryExhausted);
        assert_eq!(wrapped.original(), Some(&last));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert_eq!(policy.delay_for(31), Duration::from_secs(1 << 31));
        assert_eq!(policy.delay_for(64), Duration::MAX);
    }

    proptest! {
        #[test]
        fn prop_schedule_doubles(max_retries in 1u32..10, factor_ms in 1u64..1000) {
            let policy = RetryPolicy::new(max_retries, Duration::from_millis(factor_ms));
            let schedule = policy.schedule();
            prop_assert_eq!(schedule.len() as u32, max_retries);
            prop_assert_eq!(schedule[0], Duration::from_millis(factor_ms));
            for pair in schedule.windows(2) {
                prop_assert_eq!(pair[1], pair[0] * 2);
            }
        }

        #[test]
        fn prop_client_input_raised_on_any_attempt(attempt in 0u32..20, max_retries in 0u32..20) {
            let policy = RetryPolicy::new(max_retries, Duration::from_millis(1));
            prop_assert_eq!(policy.decide(attempt, ErrorKind::NotFound), RetryDecision::Raise);
        }
    }
}
