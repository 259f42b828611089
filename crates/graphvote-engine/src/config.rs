//! Engine configuration.

use std::time::Duration;

use graphvote_core::RetryPolicy;

use crate::error::{Error, Result};

/// How long a success or failure indicator stays up before returning to neutral.
pub const DEFAULT_OUTCOME_DISPLAY: Duration = Duration::from_secs(2);

/// Configuration shared by every vote controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Backoff schedule for failed cast/remove calls.
    pub retry: RetryPolicy,

    /// Display window for the last outcome.
    pub outcome_display: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            outcome_display: DEFAULT_OUTCOME_DISPLAY,
        }
    }
}

impl EngineConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// - `GRAPHVOTE_MAX_ATTEMPTS`: total attempts per vote
    /// - `GRAPHVOTE_RETRY_BASE_MS`: delay before the first retry
    /// - `GRAPHVOTE_OUTCOME_DISPLAY_MS`: outcome indicator window
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(attempts) = parse_var::<u32>(&lookup, "GRAPHVOTE_MAX_ATTEMPTS")? {
            if attempts == 0 {
                return Err(Error::Config("GRAPHVOTE_MAX_ATTEMPTS must be at least 1".into()));
            }
            config.retry = config.retry.with_max_attempts(attempts);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "GRAPHVOTE_RETRY_BASE_MS")? {
            config.retry = config.retry.with_base_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "GRAPHVOTE_OUTCOME_DISPLAY_MS")? {
            config.outcome_display = Duration::from_millis(ms);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_outcome_display(mut self, window: Duration) -> Self {
        self.outcome_display = window;
        self
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("invalid {}: {:?}", key, raw))),
    }
}
