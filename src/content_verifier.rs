//! Checks whether a file in a repository mentions the needle.

use base64::prelude::*;
use tracing::{debug, warn};

use crate::error::Result;
use crate::github_searcher::GitHubSearcher;
use crate::models::FileContent;

impl GitHubSearcher {
    /// Fetch `file_path` from `repo_full_name` and test for `needle`,
    /// ignoring case.
    ///
    /// Files served without inline content (too large for the contents API)
    /// and content that cannot be decoded count as "no match".
    pub async fn contains_text(
        &mut self,
        repo_full_name: &str,
        file_path: &str,
        needle: &str,
    ) -> Result<bool> {
        self.governor.ensure_quota(&self.transport).await;

        let url_path = format!("/repos/{}/contents/{}", repo_full_name, file_path);
        let response = self.transport.get(&url_path, &[]).await?;
        self.governor.record_headers(response.headers());

        if !response.status().is_success() {
            warn!(
                "Could not fetch {} from {}: {}",
                file_path,
                repo_full_name,
                response.status()
            );
            return Ok(false);
        }

        let file: FileContent = match response.json().await {
            Ok(file) => file,
            Err(e) => {
                warn!("Unreadable contents response for {}: {}", file_path, e);
                return Ok(false);
            }
        };

        let encoded = match file.content.as_deref() {
            Some(content) if !content.is_empty() => content,
            _ => {
                debug!(
                    "No inline content for {} (encoding {:?}), skipping",
                    file_path, file.encoding
                );
                return Ok(false);
            }
        };

        match decode_content(encoded) {
            Ok(text) => Ok(text.to_lowercase().contains(&needle.to_lowercase())),
            Err(e) => {
                warn!("Could not decode {}: {}", file_path, e);
                Ok(false)
            }
        }
    }
}

/// Decode the base64 transport encoding GitHub uses for file content. The
/// API wraps the encoded text at 60 columns, so whitespace is dropped first.
pub fn decode_content(encoded: &str) -> std::result::Result<String, String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64_STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}
