//! Data carried between the search calls, the crawler and the report.

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

// ============================================================================
// API Response Types
// ============================================================================

/// Envelope shared by the repository and code search endpoints.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct SearchResponse<T> {
    #[serde(default)]
    pub items: Vec<T>,
}

/// One item of a repository search.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryCandidate {
    pub full_name: String,
    pub html_url: String,
    #[serde(rename = "stargazers_count", default)]
    pub stars: u64,
    #[serde(default)]
    pub description: Option<String>,
}

/// One item of a code search.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeSearchItem {
    pub name: String,
    pub path: String,
    pub html_url: String,
}

/// Body of the contents endpoint. Files above the inline size limit come
/// back without `content`.
#[derive(Debug, Deserialize)]
pub struct FileContent {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

/// Body of `GET /rate_limit`.
#[derive(Debug, Deserialize)]
pub struct RateLimitStatus {
    pub rate: RateWindow,
}

#[derive(Debug, Deserialize)]
pub struct RateWindow {
    pub remaining: u32,
    /// Unix timestamp at which the window resets.
    pub reset: i64,
}

// ============================================================================
// Crawl Results
// ============================================================================

/// Bucket a matching file is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    DependencyManifest,
    CiConfig,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::DependencyManifest, Category::CiConfig];

    pub fn label(&self) -> &'static str {
        match self {
            Category::DependencyManifest => "dependency-manifest",
            Category::CiConfig => "ci-config",
        }
    }

    /// Human readable heading used in the report.
    pub fn title(&self) -> &'static str {
        match self {
            Category::DependencyManifest => "Dependency manifest",
            Category::CiConfig => "CI config (.yml)",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A file name or extension searched in every repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestPattern {
    /// Exact file name, or an extension when it starts with a dot.
    pub pattern: &'static str,
    pub category: Category,
}

/// Patterns searched per repository, in order.
pub const MANIFEST_PATTERNS: [ManifestPattern; 3] = [
    ManifestPattern {
        pattern: "requirements.txt",
        category: Category::DependencyManifest,
    },
    ManifestPattern {
        pattern: ".yml",
        category: Category::CiConfig,
    },
    ManifestPattern {
        pattern: "pyproject.toml",
        category: Category::DependencyManifest,
    },
];

/// A candidate file confirmed to contain the needle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMatch {
    pub name: String,
    pub path: String,
    pub html_url: String,
}

impl From<CodeSearchItem> for FileMatch {
    fn from(item: CodeSearchItem) -> Self {
        Self {
            name: item.name,
            path: item.path,
            html_url: item.html_url,
        }
    }
}

/// Everything recorded about one matching repository.
#[derive(Debug, Clone)]
pub struct RepoResult {
    pub full_name: String,
    pub repo_url: String,
    pub stars: u64,
    pub description: Option<String>,
    pub dependency_manifests: Vec<FileMatch>,
    pub ci_configs: Vec<FileMatch>,
}

impl RepoResult {
    pub fn new(candidate: &RepositoryCandidate) -> Self {
        Self {
            full_name: candidate.full_name.clone(),
            repo_url: candidate.html_url.clone(),
            stars: candidate.stars,
            description: candidate.description.clone(),
            dependency_manifests: Vec::new(),
            ci_configs: Vec::new(),
        }
    }

    pub fn matches(&self, category: Category) -> &[FileMatch] {
        match category {
            Category::DependencyManifest => &self.dependency_manifests,
            Category::CiConfig => &self.ci_configs,
        }
    }

    pub fn push_match(&mut self, category: Category, file: FileMatch) {
        match category {
            Category::DependencyManifest => self.dependency_manifests.push(file),
            Category::CiConfig => self.ci_configs.push(file),
        }
    }

    pub fn has_matches(&self) -> bool {
        !self.dependency_manifests.is_empty() || !self.ci_configs.is_empty()
    }
}

/// Matching repositories of one run, in the order they were found.
#[derive(Debug, Default)]
pub struct ResultSet {
    entries: Vec<RepoResult>,
    names: HashSet<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.names.contains(full_name)
    }

    /// Adds `result` unless it has no matches or its repository is already
    /// present. Returns whether it was added.
    pub fn insert(&mut self, result: RepoResult) -> bool {
        if !result.has_matches() || self.names.contains(&result.full_name) {
            return false;
        }
        self.names.insert(result.full_name.clone());
        self.entries.push(result);
        true
    }

    pub fn get(&self, full_name: &str) -> Option<&RepoResult> {
        self.entries.iter().find(|r| r.full_name == full_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepoResult> {
        self.entries.iter()
    }

    pub fn summary(&self) -> CrawlSummary {
        let count = |category| {
            self.entries
                .iter()
                .filter(|r| !r.matches(category).is_empty())
                .count()
        };
        CrawlSummary {
            total: self.len(),
            with_dependency_manifests: count(Category::DependencyManifest),
            with_ci_configs: count(Category::CiConfig),
        }
    }
}

/// Counts printed at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    pub total: usize,
    pub with_dependency_manifests: usize,
    pub with_ci_configs: usize,
}
