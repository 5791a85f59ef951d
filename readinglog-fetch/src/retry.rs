//! Bounded retry with exponential backoff.

use reqwest::StatusCode;
use std::time::Duration;

/// When and how long to wait before repeating a failed page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with `max_attempts` attempts, 1s base delay, 60s cap.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1)
    }

    /// Sets the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Delay after the given (1-based) failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempt` attempts.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Connection failures and timeouts are worth repeating.
    pub fn retries_error(&self, error: &reqwest::Error) -> bool {
        error.is_connect() || error.is_timeout()
    }

    /// Rate limiting and server errors are worth repeating.
    pub fn retries_status(&self, status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::new(10).with_base_delay(Duration::from_secs(10));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(60));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_secs(60));
    }

    #[test]
    fn test_attempt_budget() {
        let policy = RetryPolicy::new(3);
        assert!(policy.allows_retry(1));
        assert!(policy.allows_retry(2));
        assert!(!policy.allows_retry(3));
        assert!(!RetryPolicy::none().allows_retry(1));
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }

    #[test]
    fn test_retryable_statuses() {
        let policy = RetryPolicy::default();
        assert!(policy.retries_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(policy.retries_status(StatusCode::BAD_GATEWAY));
        assert!(!policy.retries_status(StatusCode::NOT_FOUND));
        assert!(!policy.retries_status(StatusCode::UNAUTHORIZED));
    }
}
