use clap::Parser;
use dotenv::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use transitions_finder::{
    write_report, Args, Crawler, CrawlerConfig, NoPrompt, Prompt, StdinPrompt,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    // Initialize the tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Ask for missing settings only when someone can answer.
    let mut prompt: Box<dyn Prompt> = if !args.no_prompt && StdinPrompt::is_available() {
        Box::new(StdinPrompt)
    } else {
        Box::new(NoPrompt)
    };
    let config = CrawlerConfig::resolve(args, prompt.as_mut());

    info!(
        "Starting segmented search over up to {} {} repositories for '{}'",
        config.max_repos, config.language, config.needle
    );

    let progress = ProgressBar::new(config.max_repos as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let mut crawler = Crawler::new(&config)?.with_progress(progress);
    let results = crawler.run(config.max_repos).await?;

    write_report(
        &config.report_path,
        &results,
        &config.needle,
        &chrono::Local::now(),
    )
    .await?;

    let summary = results.summary();
    println!("\nResults summary:");
    println!("Total relevant repositories found: {}", summary.total);
    println!(
        "Repositories with '{}' in dependency manifests: {}",
        config.needle, summary.with_dependency_manifests
    );
    println!(
        "Repositories with '{}' in .yml files: {}",
        config.needle, summary.with_ci_configs
    );
    println!("Full results saved to '{}'", config.report_path.display());

    Ok(())
}
