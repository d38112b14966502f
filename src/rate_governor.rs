//! Client-side bookkeeping of the GitHub API quota.
//!
//! The governor remembers the last `X-RateLimit-Remaining` value it saw and,
//! once that drops under a low-water mark, asks `/rate_limit` for the real
//! numbers before the next call. Governance is advisory: if the status
//! request fails the crawl simply carries on.

use chrono::DateTime;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::models::RateLimitStatus;
use crate::transport::GitHubTransport;

/// Assumed remaining quota before the first response is seen.
pub const INITIAL_REMAINING: u32 = 1000;
/// Below this many remaining calls the quota status is refreshed.
pub const LOW_WATER_MARK: u32 = 10;
/// Below this many remaining calls the governor waits for the reset.
pub const CRITICAL_MARK: u32 = 5;
/// Seconds added on top of the provider's reset time.
pub const RESET_MARGIN_SECS: i64 = 10;
/// Floor for the wait after an explicit quota-exceeded response.
pub const MIN_QUOTA_EXCEEDED_WAIT_SECS: i64 = 60;

pub struct RateGovernor {
    remaining: u32,
    clock: Arc<dyn Clock>,
}

impl RateGovernor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            remaining: INITIAL_REMAINING,
            clock,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn set_remaining(&mut self, remaining: u32) {
        self.remaining = remaining;
    }

    /// Record the remaining quota reported on a response. Missing or
    /// unparsable headers keep the previous value.
    pub fn record_headers(&mut self, headers: &HeaderMap) {
        if let Some(remaining) = headers
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            self.remaining = remaining;
        }
    }

    /// Call before every outbound request.
    pub async fn ensure_quota(&mut self, transport: &GitHubTransport) {
        if self.remaining >= LOW_WATER_MARK {
            return;
        }

        warn!(
            "Approaching rate limit ({} calls left), checking quota status",
            self.remaining
        );
        let status = match fetch_status(transport).await {
            Some(status) => status,
            None => return,
        };

        self.remaining = status.rate.remaining;
        debug!(
            remaining = status.rate.remaining,
            reset = status.rate.reset,
            "Quota status refreshed"
        );

        if self.remaining < CRITICAL_MARK {
            let wait_secs = status.rate.reset - self.clock.now().timestamp() + RESET_MARGIN_SECS;
            if wait_secs > 0 {
                warn!(
                    "Rate limit almost exhausted. Waiting {} seconds for reset...",
                    wait_secs
                );
                self.clock.sleep(Duration::from_secs(wait_secs as u64)).await;
            }
        }
    }

    /// Wait after the provider explicitly reported the quota as exceeded.
    /// `reset` is the provider's reset timestamp (0 when unknown).
    pub async fn wait_for_reset(&self, reset: i64) {
        let wait_secs = quota_exceeded_wait_secs(reset, self.clock.now().timestamp());
        let reset_at = DateTime::from_timestamp(reset, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        warn!(
            "Rate limit exceeded. Waiting {} seconds until reset ({})...",
            wait_secs, reset_at
        );
        self.clock.sleep(Duration::from_secs(wait_secs)).await;
    }
}

/// `max(reset - now + 10, 60)` seconds.
pub fn quota_exceeded_wait_secs(reset: i64, now: i64) -> u64 {
    (reset - now + RESET_MARGIN_SECS).max(MIN_QUOTA_EXCEEDED_WAIT_SECS) as u64
}

/// Reads the reset timestamp from a response, 0 when absent.
pub fn reset_timestamp(headers: &HeaderMap) -> i64 {
    headers
        .get("X-RateLimit-Reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

async fn fetch_status(transport: &GitHubTransport) -> Option<RateLimitStatus> {
    let response = match transport.get("/rate_limit", &[]).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Quota status request failed, proceeding anyway: {}", e);
            return None;
        }
    };

    if !response.status().is_success() {
        warn!(
            "Quota status request returned {}, proceeding anyway",
            response.status()
        );
        return None;
    }

    match response.json::<RateLimitStatus>().await {
        Ok(status) => Some(status),
        Err(e) => {
            warn!("Could not parse quota status, proceeding anyway: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::ManualClock;
    use reqwest::header::HeaderValue;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NOW: i64 = 1_700_000_000;

    async fn status_server(remaining: u32, reset: i64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resources": {},
                "rate": { "limit": 5000, "remaining": remaining, "reset": reset, "used": 4998 }
            })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_plenty_of_quota_makes_no_status_call() {
        let server = status_server(0, NOW + 100).await;
        let clock = Arc::new(ManualClock::at_timestamp(NOW));
        let transport = GitHubTransport::new(&server.uri(), None).unwrap();
        let mut governor = RateGovernor::new(clock.clone());

        governor.ensure_quota(&transport).await;

        assert_eq!(governor.remaining(), INITIAL_REMAINING);
        assert!(server.received_requests().await.unwrap().is_empty());
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_critical_quota_waits_until_reset_plus_margin() {
        let reset = NOW + 300;
        let server = status_server(2, reset).await;
        let clock = Arc::new(ManualClock::at_timestamp(NOW));
        let transport = GitHubTransport::new(&server.uri(), None).unwrap();
        let mut governor = RateGovernor::new(clock.clone());
        governor.set_remaining(3);

        governor.ensure_quota(&transport).await;

        assert_eq!(governor.remaining(), 2);
        let waited: u64 = clock.sleeps().iter().map(|d| d.as_secs()).sum();
        assert!(waited >= (reset - NOW + RESET_MARGIN_SECS) as u64);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(310)]);
    }

    #[tokio::test]
    async fn test_low_but_not_critical_quota_refreshes_without_waiting() {
        let server = status_server(4000, NOW + 300).await;
        let clock = Arc::new(ManualClock::at_timestamp(NOW));
        let transport = GitHubTransport::new(&server.uri(), None).unwrap();
        let mut governor = RateGovernor::new(clock.clone());
        governor.set_remaining(7);

        governor.ensure_quota(&transport).await;

        assert_eq!(governor.remaining(), 4000);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_failed_status_request_fails_open() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let clock = Arc::new(ManualClock::at_timestamp(NOW));
        let transport = GitHubTransport::new(&server.uri(), None).unwrap();
        let mut governor = RateGovernor::new(clock.clone());
        governor.set_remaining(1);

        governor.ensure_quota(&transport).await;

        assert_eq!(governor.remaining(), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_reset_has_sixty_second_floor() {
        for (reset, expected) in [(NOW + 5, 60), (NOW + 500, 510), (0, 60)] {
            let clock = Arc::new(ManualClock::at_timestamp(NOW));
            let governor = RateGovernor::new(clock.clone());

            governor.wait_for_reset(reset).await;

            assert_eq!(clock.sleeps(), vec![Duration::from_secs(expected)]);
        }
    }

    #[test]
    fn test_record_headers() {
        let clock = Arc::new(ManualClock::at_timestamp(NOW));
        let mut governor = RateGovernor::new(clock);

        let mut headers = HeaderMap::new();
        headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("42"));
        governor.record_headers(&headers);
        assert_eq!(governor.remaining(), 42);

        governor.record_headers(&HeaderMap::new());
        assert_eq!(governor.remaining(), 42);

        headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("lots"));
        governor.record_headers(&headers);
        assert_eq!(governor.remaining(), 42);
    }

    #[test]
    fn test_reset_timestamp_defaults_to_zero() {
        let mut headers = HeaderMap::new();
        assert_eq!(reset_timestamp(&headers), 0);
        headers.insert("X-RateLimit-Reset", HeaderValue::from_static("1700000123"));
        assert_eq!(reset_timestamp(&headers), 1_700_000_123);
    }
}
