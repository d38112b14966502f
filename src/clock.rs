//! Time source used for every wait the crawler performs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Duration;

/// Wall clock plus a way to block until some time has passed.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the crawl for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by `chrono` and `tokio::time`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
