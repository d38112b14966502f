//! Authenticated HTTP access to the GitHub REST API.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response};
use tracing::debug;

use crate::error::{CrawlError, Result};

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("transitions-finder/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper around a `reqwest::Client` carrying the base URL and the
/// headers every GitHub call needs.
#[derive(Debug, Clone)]
pub struct GitHubTransport {
    client: Client,
    base_url: String,
}

impl GitHubTransport {
    /// Build a transport. Without a token requests are unauthenticated and
    /// subject to a much lower quota.
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| CrawlError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET `path` (relative to the base URL) with the given query string.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Requesting URL: {} {:?}", url, query);
        Ok(self.client.get(&url).query(query).send().await?)
    }
}
