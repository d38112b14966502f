//! Error types for the crawler.
//!
//! Only failures that should end a run are represented here. Provider-side
//! problems (bad status codes, oversized files, undecodable content) degrade
//! to "no results" at the call site and never become a [`CrawlError`].

use thiserror::Error;

/// Errors that abort a crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Transport-level HTTP failure (DNS, connection refused, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem failure while preparing outputs or writing the report.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured token cannot be used as a header value.
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
