//! # Transitions Finder
//!
//! A Rust library for finding GitHub repositories whose dependency manifests
//! (`requirements.txt`, `pyproject.toml`) or `.yml` configs mention a library,
//! with segmented searches, rate-limit handling and bounded retries.
//!
//! ## Main Components
//!
//! - [`Crawler`]: walks the segmented repository searches and collects matches
//! - [`GitHubSearcher`]: repository/code searches and file content checks
//! - [`RateGovernor`]: client-side quota bookkeeping
//! - [`segmented_queries`]: splits one search into segments under the 1000-result cap
//! - [`write_report`]: plain-text report of a finished crawl
//! - [`Args`] / [`CrawlerConfig`]: command line and resolved settings
//!
//! ## Example
//!
//! ```no_run
//! use transitions_finder::{write_report, Crawler, CrawlerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CrawlerConfig {
//!         token: std::env::var("GITHUB_TOKEN").ok(),
//!         max_repos: 50,
//!         ..CrawlerConfig::default()
//!     };
//!
//!     let mut crawler = Crawler::new(&config)?;
//!     let results = crawler.run(config.max_repos).await?;
//!
//!     write_report(&config.report_path, &results, &config.needle, &chrono::Local::now()).await?;
//!     Ok(())
//! }
//! ```

mod args;
pub mod clock;
pub mod config;
mod content_verifier;
mod crawler;
pub mod error;
mod github_searcher;
pub mod models;
pub mod rate_governor;
mod report;
pub mod retry;
pub mod segmenter;
pub mod transport;

// Re-export main components for documentation and external use
pub use crate::args::Args;
pub use crate::clock::{Clock, SystemClock};
pub use crate::config::{CrawlerConfig, NoPrompt, Prompt, StdinPrompt};
pub use crate::content_verifier::decode_content;
pub use crate::crawler::Crawler;
pub use crate::error::{CrawlError, Result};
pub use crate::github_searcher::GitHubSearcher;
pub use crate::models::{Category, CrawlSummary, FileMatch, RepoResult, ResultSet};
pub use crate::rate_governor::RateGovernor;
pub use crate::report::{render_report, write_report};
pub use crate::segmenter::segmented_queries;
