//! Bounded exponential backoff for failed vote mutations.
//!
//! The policy is stateless: callers pass the 1-based attempt number and get
//! back the delay to wait before making it. It never owns a timer, so the
//! caller decides how to sleep and how to cancel.

use std::time::Duration;

/// Default total attempts (one immediate plus two retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry; doubles for each later one.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Retry policy for vote mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,

    /// Delay before attempt 2. Attempt `n` waits `base_delay * 2^(n-2)`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay to wait before making `attempt` (1-based).
    ///
    /// Returns `None` once the attempt budget is spent.
    ///
    /// ```
    /// use std::time::Duration;
    /// use graphvote_core::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay_before(1), Some(Duration::ZERO));
    /// assert_eq!(policy.delay_before(2), Some(Duration::from_secs(1)));
    /// assert_eq!(policy.delay_before(3), Some(Duration::from_secs(2)));
    /// assert_eq!(policy.delay_before(4), None);
    /// ```
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        if attempt == 1 {
            return Some(Duration::ZERO);
        }
        let factor = 1u32 << (attempt - 2).min(31);
        Some(self.base_delay.saturating_mul(factor))
    }
}
