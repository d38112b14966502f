//! Retry policy for code search requests.

use reqwest::StatusCode;
use tokio::time::Duration;

/// Body marker GitHub sends alongside a 403 when the quota is exhausted.
const QUOTA_EXCEEDED_MARKER: &str = "rate limit exceeded";

/// Bounded exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt, in seconds.
    pub base_delay_secs: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_secs: 30,
        }
    }

    pub fn with_base_delay(mut self, secs: u64) -> Self {
        self.base_delay_secs = secs;
        self
    }

    /// Delay after the failed attempt with zero-based index `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.base_delay_secs.saturating_mul(2u64.saturating_pow(attempt)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Whether a response signals an exhausted quota rather than a failure.
pub fn is_quota_exceeded(status: StatusCode, body: &str) -> bool {
    status == StatusCode::FORBIDDEN && body.to_lowercase().contains(QUOTA_EXCEEDED_MARKER)
}
