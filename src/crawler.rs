//! Drives the segmented searches and collects matching repositories.

use chrono::{Datelike, Local};
use indicatif::ProgressBar;
use tracing::{debug, info};

use crate::config::CrawlerConfig;
use crate::error::Result;
use crate::github_searcher::GitHubSearcher;
use crate::models::{
    FileMatch, ManifestPattern, RepoResult, RepositoryCandidate, ResultSet, MANIFEST_PATTERNS,
};
use crate::segmenter::segmented_queries;

/// Repositories requested per search page.
pub const REPOS_PER_PAGE: u32 = 30;
/// A page shorter than this is taken as the last one of its query.
pub const MIN_FULL_PAGE: usize = 10;
/// Pages fetched per query at most, about 900 results, under the 1000 cap.
pub const MAX_PAGES_PER_QUERY: u32 = 30;

pub struct Crawler {
    searcher: GitHubSearcher,
    queries: Vec<String>,
    needle: String,
    patterns: Vec<ManifestPattern>,
    progress: ProgressBar,
}

impl Crawler {
    /// Crawler over the default segments for the configured language.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let searcher = GitHubSearcher::new(config)?;
        let queries = segmented_queries(&config.language, Local::now().year());
        Ok(Self::from_parts(searcher, queries, &config.needle))
    }

    pub fn from_parts(searcher: GitHubSearcher, queries: Vec<String>, needle: &str) -> Self {
        Self {
            searcher,
            queries,
            needle: needle.to_string(),
            patterns: MANIFEST_PATTERNS.to_vec(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Report progress on `progress` instead of a hidden bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Walk every segment until `max_repos` distinct repositories have been
    /// examined, returning those that mention the needle.
    pub async fn run(&mut self, max_repos: usize) -> Result<ResultSet> {
        tokio::fs::create_dir_all(self.searcher.output_dir()).await?;

        let mut results = ResultSet::new();
        let mut repos_checked = 0usize;
        let queries = self.queries.clone();
        info!("Created {} segmented queries", queries.len());
        self.progress.set_length(max_repos as u64);

        for (index, query) in queries.iter().enumerate() {
            if repos_checked >= max_repos {
                break;
            }
            info!("Running query {}/{}: {}", index + 1, queries.len(), query);

            let mut page: u32 = 1;
            while repos_checked < max_repos {
                debug!("Fetching page {} of '{}'", page, query);
                let repos = self
                    .searcher
                    .search_repositories(query, page, REPOS_PER_PAGE)
                    .await?;

                if repos.is_empty() {
                    info!("No more repositories for '{}'", query);
                    break;
                }

                for repo in &repos {
                    if repos_checked >= max_repos {
                        break;
                    }
                    if results.contains(&repo.full_name) {
                        debug!("{} already recorded, skipping", repo.full_name);
                        continue;
                    }

                    repos_checked += 1;
                    self.progress.set_message(repo.full_name.clone());
                    self.progress.inc(1);
                    info!("[{}/{}] Checking {}", repos_checked, max_repos, repo.full_name);

                    let result = self.examine(repo).await?;
                    results.insert(result);
                }

                page += 1;

                if repos.len() < MIN_FULL_PAGE {
                    info!("Short page for '{}', moving to the next query", query);
                    break;
                }
                if page > MAX_PAGES_PER_QUERY {
                    info!("Page limit reached for '{}', moving to the next query", query);
                    break;
                }
            }
        }

        self.progress.finish_with_message(format!(
            "Checked {} repositories, {} relevant",
            repos_checked,
            results.len()
        ));
        Ok(results)
    }

    /// Search every manifest pattern in `repo` and keep the files that
    /// mention the needle.
    async fn examine(&mut self, repo: &RepositoryCandidate) -> Result<RepoResult> {
        let mut result = RepoResult::new(repo);

        for pattern in &self.patterns {
            let candidates = self
                .searcher
                .search_code_in_repo(&repo.full_name, pattern.pattern)
                .await?;

            for file in candidates {
                if self
                    .searcher
                    .contains_text(&repo.full_name, &file.path, &self.needle)
                    .await?
                {
                    info!(
                        "✓ {} in {} contains '{}' ({})",
                        file.path, repo.full_name, self.needle, pattern.category
                    );
                    result.push_match(pattern.category, FileMatch::from(file));
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::models::Category;
    use crate::report::render_report;
    use base64::prelude::*;
    use serde_json::{json, Value};
    use std::path::Path;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn crawler(server: &MockServer, output_dir: &Path, queries: &[&str]) -> Crawler {
        let config = CrawlerConfig {
            api_url: server.uri(),
            output_dir: output_dir.to_path_buf(),
            ..CrawlerConfig::default()
        };
        let searcher =
            GitHubSearcher::with_clock(&config, Arc::new(ManualClock::at_timestamp(0))).unwrap();
        Crawler::from_parts(
            searcher,
            queries.iter().map(|q| q.to_string()).collect(),
            "transitions",
        )
    }

    fn repo(name: &str) -> Value {
        json!({
            "full_name": name,
            "html_url": format!("https://github.com/{}", name),
            "stargazers_count": 5,
            "description": null
        })
    }

    fn items(items: Vec<Value>) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "total_count": items.len(), "items": items }))
    }

    async fn mount_repo_search(server: &MockServer, query: &str, repos: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/search/repositories"))
            .and(query_param("q", query))
            .respond_with(items(repos))
            .mount(server)
            .await;
    }

    async fn mount_code_search(server: &MockServer, q: &str, files: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/search/code"))
            .and(query_param("q", q))
            .respond_with(items(files))
            .mount(server)
            .await;
    }

    /// Any code search not mounted explicitly finds nothing.
    async fn mount_empty_code_search(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/search/code"))
            .respond_with(items(vec![]))
            .mount(server)
            .await;
    }

    async fn mount_acme_requirements(server: &MockServer) {
        mount_code_search(
            server,
            "filename:requirements.txt repo:acme/app",
            vec![json!({
                "name": "requirements.txt",
                "path": "requirements.txt",
                "html_url": "https://github.com/acme/app/blob/main/requirements.txt"
            })],
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/app/contents/requirements.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "encoding": "base64",
                "content": BASE64_STANDARD.encode("requests==2.31\nTransitions==0.8.0\n")
            })))
            .mount(server)
            .await;
    }

    async fn count_requests(server: &MockServer, request_path: &str) -> usize {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == request_path)
            .count()
    }

    #[tokio::test]
    async fn test_end_to_end_single_match() {
        let server = MockServer::start().await;
        mount_repo_search(&server, "language:python", vec![repo("acme/app")]).await;
        mount_acme_requirements(&server).await;
        mount_empty_code_search(&server).await;
        let dir = tempfile::tempdir().unwrap();
        let mut crawler = crawler(&server, dir.path(), &["language:python"]);

        let results = crawler.run(1000).await.unwrap();

        assert_eq!(results.len(), 1);
        let found = results.get("acme/app").unwrap();
        assert_eq!(found.matches(Category::DependencyManifest).len(), 1);
        assert_eq!(found.matches(Category::CiConfig).len(), 0);
        assert_eq!(found.dependency_manifests[0].path, "requirements.txt");

        let report = render_report(&results, "transitions", &chrono::Utc::now());
        assert!(report
            .lines()
            .any(|l| l == "Dependency manifest files containing 'transitions': 1"));

        // One raw artifact per manifest pattern.
        assert!(dir.path().join("acme_app_requirements_txt_search_results.json").exists());
        assert!(dir.path().join("acme_app__yml_search_results.json").exists());
        assert!(dir.path().join("acme_app_pyproject_toml_search_results.json").exists());
    }

    #[tokio::test]
    async fn test_repository_without_matches_is_not_recorded() {
        let server = MockServer::start().await;
        mount_repo_search(&server, "language:python", vec![repo("acme/empty")]).await;
        mount_empty_code_search(&server).await;
        let dir = tempfile::tempdir().unwrap();
        let mut crawler = crawler(&server, dir.path(), &["language:python"]);

        let results = crawler.run(1000).await.unwrap();

        assert!(results.is_empty());
        assert_eq!(count_requests(&server, "/search/code").await, 3);
    }

    #[tokio::test]
    async fn test_repository_seen_in_several_segments_is_examined_once() {
        let server = MockServer::start().await;
        mount_repo_search(&server, "q1", vec![repo("acme/app")]).await;
        mount_repo_search(&server, "q2", vec![repo("acme/app")]).await;
        mount_acme_requirements(&server).await;
        mount_empty_code_search(&server).await;
        let dir = tempfile::tempdir().unwrap();
        let mut crawler = crawler(&server, dir.path(), &["q1", "q2"]);

        let results = crawler.run(1000).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(count_requests(&server, "/search/repositories").await, 2);
        assert_eq!(count_requests(&server, "/search/code").await, 3);
    }

    #[tokio::test]
    async fn test_pagination_stops_at_page_cap() {
        let server = MockServer::start().await;
        // Full pages forever; the only repository matches, so every
        // repeat of it is skipped.
        mount_repo_search(&server, "q", (0..10).map(|_| repo("acme/app")).collect()).await;
        mount_acme_requirements(&server).await;
        mount_empty_code_search(&server).await;
        let dir = tempfile::tempdir().unwrap();
        let mut crawler = crawler(&server, dir.path(), &["q"]);

        let results = crawler.run(1000).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(
            count_requests(&server, "/search/repositories").await,
            MAX_PAGES_PER_QUERY as usize
        );
    }

    #[tokio::test]
    async fn test_short_page_ends_query() {
        let server = MockServer::start().await;
        mount_repo_search(
            &server,
            "q",
            (0..9).map(|i| repo(&format!("acme/r{}", i))).collect(),
        )
        .await;
        mount_empty_code_search(&server).await;
        let dir = tempfile::tempdir().unwrap();
        let mut crawler = crawler(&server, dir.path(), &["q"]);

        crawler.run(1000).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let pages: Vec<String> = requests
            .iter()
            .filter(|r| r.url.path() == "/search/repositories")
            .filter_map(|r| {
                r.url
                    .query_pairs()
                    .find(|(k, _)| k == "page")
                    .map(|(_, v)| v.to_string())
            })
            .collect();
        assert_eq!(pages, vec!["1".to_string()]);
        assert_eq!(count_requests(&server, "/search/code").await, 27);
    }

    #[tokio::test]
    async fn test_max_repos_bounds_examined_repositories() {
        let server = MockServer::start().await;
        mount_repo_search(
            &server,
            "q1",
            (0..30).map(|i| repo(&format!("acme/r{}", i))).collect(),
        )
        .await;
        mount_repo_search(&server, "q2", vec![repo("acme/other")]).await;
        mount_empty_code_search(&server).await;
        let dir = tempfile::tempdir().unwrap();
        let mut crawler = crawler(&server, dir.path(), &["q1", "q2"]);

        let results = crawler.run(5).await.unwrap();

        assert!(results.is_empty());
        // Non-matching repositories still count towards the limit.
        assert_eq!(count_requests(&server, "/search/code").await, 15);
        assert_eq!(count_requests(&server, "/search/repositories").await, 1);
    }

    #[tokio::test]
    async fn test_failed_repository_search_moves_to_next_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/repositories"))
            .and(query_param("q", "broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_repo_search(&server, "ok", vec![repo("acme/app")]).await;
        mount_acme_requirements(&server).await;
        mount_empty_code_search(&server).await;
        let dir = tempfile::tempdir().unwrap();
        let mut crawler = crawler(&server, dir.path(), &["broken", "ok"]);

        let results = crawler.run(1000).await.unwrap();

        assert!(results.contains("acme/app"));
    }
}
