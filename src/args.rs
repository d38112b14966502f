use clap::Parser;

/// Finds GitHub repositories whose dependency manifests or CI configs mention
/// a library, with segmented searches and rate-limit handling.
#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = "Crawls GitHub repository search in segments, looks for requirements.txt, pyproject.toml and .yml files in every repository found, and reports those that mention the given library."
)]
pub struct Args {
    /// GitHub API token for authentication.
    #[clap(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Maximum number of repositories to examine (default 1000).
    /// Invalid values fall back to the default.
    #[clap(short, long, value_name = "NUM")]
    pub max_repos: Option<String>,

    /// Text to look for inside manifest files (case-insensitive).
    #[clap(short, long, default_value = "transitions")]
    pub needle: String,

    /// Repository language used as the base search filter.
    #[clap(short, long, default_value = "python")]
    pub language: String,

    /// Directory receiving the raw code search responses.
    #[clap(long, default_value = "output")]
    pub output_dir: String,

    /// Path of the text report.
    #[clap(short, long, default_value = "repo_search_results.txt")]
    pub report: String,

    /// Base URL of the GitHub REST API.
    #[clap(long, default_value = "https://api.github.com")]
    pub api_url: String,

    /// Never ask for missing settings on stdin.
    #[clap(long)]
    pub no_prompt: bool,
}
