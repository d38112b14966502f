//! Plain-text report of a finished crawl.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::models::{Category, ResultSet};

fn rule() -> String {
    "-".repeat(80)
}

/// Render the report for `results`.
pub fn render_report<Tz>(results: &ResultSet, needle: &str, generated_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut lines = vec![
        format!("Repositories referencing '{}'", needle),
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        rule(),
        String::new(),
    ];

    if results.is_empty() {
        lines.push("No repositories matching the criteria were found.".to_string());
    } else {
        lines.push(format!("Total repositories found: {}", results.len()));
        lines.push(String::new());
    }

    for repo in results.iter() {
        lines.push(format!("Repository: {}", repo.full_name));
        lines.push(format!("URL: {}", repo.repo_url));
        lines.push(format!("Stars: {}", repo.stars));
        if let Some(description) = repo.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push(format!("Description: {}", description));
        }

        for category in Category::ALL {
            let files = repo.matches(category);
            if files.is_empty() {
                continue;
            }
            lines.push(format!(
                "{} files containing '{}': {}",
                category.title(),
                needle,
                files.len()
            ));
            for (i, file) in files.iter().enumerate() {
                lines.push(format!("  {}. {} - {}", i + 1, file.path, file.html_url));
            }
        }

        lines.push(String::new());
        lines.push(rule());
        lines.push(String::new());
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Write the whole report in one go, replacing any previous one.
pub async fn write_report<Tz>(
    path: &Path,
    results: &ResultSet,
    needle: &str,
    generated_at: &DateTime<Tz>,
) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let report = render_report(results, needle, generated_at);
    tokio::fs::write(path, report).await?;
    info!("Saved report for {} repositories to '{}'", results.len(), path.display());
    Ok(())
}
