use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::CrawlerConfig;
use crate::error::Result;
use crate::models::{CodeSearchItem, RepositoryCandidate, SearchResponse};
use crate::rate_governor::{reset_timestamp, RateGovernor};
use crate::retry::{is_quota_exceeded, RetryPolicy};
use crate::transport::GitHubTransport;

/// Results requested per code search page.
const CODE_SEARCH_PER_PAGE: u32 = 100;

/// Issues the search requests of a crawl and keeps the quota bookkeeping
/// for every call made through it.
pub struct GitHubSearcher {
    pub(crate) transport: GitHubTransport,
    pub(crate) governor: RateGovernor,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    output_dir: PathBuf,
}

impl GitHubSearcher {
    /// Create a new GitHubSearcher instance
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`GitHubSearcher::new`] but every wait goes through `clock`.
    pub fn with_clock(config: &CrawlerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let transport = GitHubTransport::new(&config.api_url, config.token.as_deref())?;

        Ok(GitHubSearcher {
            transport,
            governor: RateGovernor::new(clock.clone()),
            clock,
            retry: RetryPolicy::default(),
            output_dir: config.output_dir.clone(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn governor(&self) -> &RateGovernor {
        &self.governor
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Search repositories, best match by stars first.
    ///
    /// A single attempt. Any non-success status is logged and reported as an
    /// empty page, which callers cannot tell apart from the end of results.
    pub async fn search_repositories(
        &mut self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RepositoryCandidate>> {
        self.governor.ensure_quota(&self.transport).await;

        let params = [
            ("q", query.to_string()),
            ("sort", "stars".to_string()),
            ("order", "desc".to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        let response = self.transport.get("/search/repositories", &params).await?;
        self.governor.record_headers(response.headers());

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!(
                "Repository search failed with {} for '{}' page {}: {}",
                status, query, page, body
            );
            return Ok(Vec::new());
        }

        Ok(parse_items(&body, "repository search"))
    }

    /// Search one repository for an exact file name, or for an extension when
    /// `pattern` starts with a dot.
    ///
    /// Quota-exceeded responses wait for the reset and are retried without
    /// using up an attempt. Other failures back off exponentially and give up
    /// with an empty result once the attempts are spent.
    pub async fn search_code_in_repo(
        &mut self,
        repo_full_name: &str,
        pattern: &str,
    ) -> Result<Vec<CodeSearchItem>> {
        let params = [
            ("q", code_query(repo_full_name, pattern)),
            ("per_page", CODE_SEARCH_PER_PAGE.to_string()),
        ];

        let mut attempt = 0;
        while attempt < self.retry.max_attempts {
            self.governor.ensure_quota(&self.transport).await;

            let response = self.transport.get("/search/code", &params).await?;
            self.governor.record_headers(response.headers());
            let status = response.status();
            let reset = reset_timestamp(response.headers());
            let body = response.text().await?;

            if status.is_success() {
                let payload: Value = match serde_json::from_str(&body) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(
                            "Unreadable code search response for {} in {}: {}",
                            pattern, repo_full_name, e
                        );
                        return Ok(Vec::new());
                    }
                };
                self.save_artifact(repo_full_name, pattern, &payload).await;
                return Ok(items_from_value(payload, "code search"));
            }

            if is_quota_exceeded(status, &body) {
                self.governor.wait_for_reset(reset).await;
                continue;
            }

            error!(
                "Code search for {} in {} failed with {}: {}",
                pattern, repo_full_name, status, body
            );
            attempt += 1;
            if attempt < self.retry.max_attempts {
                let delay = self.retry.delay_for_attempt(attempt - 1);
                warn!(
                    "Attempt {}/{} failed. Waiting {}s before retrying...",
                    attempt,
                    self.retry.max_attempts,
                    delay.as_secs()
                );
                self.clock.sleep(delay).await;
            }
        }

        warn!(
            "Giving up on {} in {} after {} attempts",
            pattern, repo_full_name, self.retry.max_attempts
        );
        Ok(Vec::new())
    }

    /// Write the raw code search payload next to the others for offline
    /// inspection. Failures only cost the artifact.
    async fn save_artifact(&self, repo_full_name: &str, pattern: &str, payload: &Value) {
        let path = self.output_dir.join(artifact_file_name(repo_full_name, pattern));
        let written = match serde_json::to_string_pretty(payload) {
            Ok(json) => tokio::fs::write(&path, json).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match written {
            Ok(()) => debug!("Saved raw results to {}", path.display()),
            Err(e) => warn!("Could not save raw results to {}: {}", path.display(), e),
        }
    }
}

/// Query string for a per-repository code search.
pub fn code_query(repo_full_name: &str, pattern: &str) -> String {
    match pattern.strip_prefix('.') {
        Some(extension) => format!("extension:{} repo:{}", extension, repo_full_name),
        None => format!("filename:{} repo:{}", pattern, repo_full_name),
    }
}

/// Deterministic artifact name for a (repository, pattern) pair.
pub fn artifact_file_name(repo_full_name: &str, pattern: &str) -> String {
    let sanitize = |s: &str| s.replace(['/', '\\', '.'], "_");
    format!(
        "{}_{}_search_results.json",
        sanitize(repo_full_name),
        sanitize(pattern)
    )
}

fn parse_items<T: DeserializeOwned>(body: &str, what: &str) -> Vec<T> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => items_from_value(value, what),
        Err(e) => {
            warn!("Unreadable {} response: {}", what, e);
            Vec::new()
        }
    }
}

fn items_from_value<T: DeserializeOwned>(value: Value, what: &str) -> Vec<T> {
    match serde_json::from_value::<SearchResponse<T>>(value) {
        Ok(response) => {
            info!("{} returned {} items", what, response.items.len());
            response.items
        }
        Err(e) => {
            warn!("Unexpected {} response shape: {}", what, e);
            Vec::new()
        }
    }
}
