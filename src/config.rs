//! Run settings and how they are resolved from the command line.

use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing::warn;

use crate::args::Args;
use crate::transport::DEFAULT_API_URL;

/// Repositories examined when nothing else is configured.
pub const DEFAULT_MAX_REPOS: usize = 1000;

/// Everything a crawl needs to know. The library never prompts; missing
/// values are filled in by [`CrawlerConfig::resolve`] before the run.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Bearer token. `None` runs unauthenticated with a much lower quota.
    pub token: Option<String>,
    /// Upper bound on repositories examined, matching or not.
    pub max_repos: usize,
    /// Text searched for in manifest files, case-insensitively.
    pub needle: String,
    /// Base `language:` filter of every segment.
    pub language: String,
    pub api_url: String,
    /// Where raw code search responses are saved.
    pub output_dir: PathBuf,
    pub report_path: PathBuf,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            token: None,
            max_repos: DEFAULT_MAX_REPOS,
            needle: "transitions".to_string(),
            language: "python".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            output_dir: PathBuf::from("output"),
            report_path: PathBuf::from("repo_search_results.txt"),
        }
    }
}

/// Source of answers for settings missing from the command line.
pub trait Prompt {
    /// Ask once. `None` means no answer (empty input, closed stdin, or
    /// prompting disabled).
    fn ask(&mut self, question: &str) -> Option<String>;
}

/// Asks on stderr and reads a line from stdin.
pub struct StdinPrompt;

impl StdinPrompt {
    /// Prompting only makes sense when someone is typing.
    pub fn is_available() -> bool {
        std::io::stdin().is_terminal()
    }
}

impl Prompt for StdinPrompt {
    fn ask(&mut self, question: &str) -> Option<String> {
        eprint!("{}", question);
        std::io::stderr().flush().ok()?;
        let mut input = String::new();
        std::io::stdin().lock().read_line(&mut input).ok()?;
        let input = input.trim();
        (!input.is_empty()).then(|| input.to_string())
    }
}

/// Never answers.
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn ask(&mut self, _question: &str) -> Option<String> {
        None
    }
}

impl CrawlerConfig {
    /// Build the configuration from parsed arguments, asking `prompt` for
    /// the token and the repository limit when they were not given.
    pub fn resolve(args: Args, prompt: &mut dyn Prompt) -> Self {
        let token = args
            .token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                prompt.ask(
                    "GitHub token (leave blank to continue unauthenticated, with a much lower rate limit): ",
                )
            })
            .map(|t| t.trim().to_string());

        if token.is_none() {
            warn!("No GitHub token configured; unauthenticated requests have a much lower rate limit");
        }

        let max_repos = match args.max_repos {
            Some(raw) => parse_max_repos(&raw),
            None => prompt
                .ask(&format!(
                    "Maximum number of repositories to check (default: {}): ",
                    DEFAULT_MAX_REPOS
                ))
                .map(|raw| parse_max_repos(&raw))
                .unwrap_or(DEFAULT_MAX_REPOS),
        };

        Self {
            token,
            max_repos,
            needle: args.needle,
            language: args.language,
            api_url: args.api_url,
            output_dir: PathBuf::from(args.output_dir),
            report_path: PathBuf::from(args.report),
        }
    }
}

/// Parse a repository limit, falling back to the default on bad input.
pub fn parse_max_repos(raw: &str) -> usize {
    let raw = raw.trim();
    if raw.is_empty() {
        return DEFAULT_MAX_REPOS;
    }
    match raw.parse::<usize>() {
        Ok(n) => n,
        Err(_) => {
            warn!(
                "Invalid repository limit '{}'. Using the default: {}",
                raw, DEFAULT_MAX_REPOS
            );
            DEFAULT_MAX_REPOS
        }
    }
}
