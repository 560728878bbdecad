//! phone-finder-crawler - browser-driven phone listing harvester
//!
//! Drives Chrome over WebDriver and keeps the harvested listing in a CSV file.

use anyhow::Result;
use clap::Parser;
use phone_finder_crawler::commands::HarvestCommand;
use phone_finder_crawler::config::{Config, ResumeMode};
use phone_finder_crawler::prompt;
use std::path::PathBuf;
use tracing::{error, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "phone-finder-crawler",
    version,
    about = "Harvest a paginated phone listing and its spec pages into CSV",
    long_about = "Clicks through a 'load more' phone listing in Chrome, scrapes each item's \
                  summary and specification table, and rewrites the CSV dataset after every batch. \
                  Restarts replay enough clicks to skip rows already saved."
)]
struct Cli {
    /// New-data clicks per iteration (prompted for when omitted)
    #[arg(short, long)]
    max_clicks: Option<usize>,

    /// Listing page URL
    #[arg(long, env = "PFC_URL")]
    url: Option<String>,

    /// CSV dataset path
    #[arg(short, long, env = "PFC_OUTPUT")]
    output: Option<PathBuf>,

    /// WebDriver server URL
    #[arg(long, env = "PFC_WEBDRIVER")]
    webdriver: Option<String>,

    /// chromedriver executable to spawn
    #[arg(long, env = "PFC_DRIVER_PATH")]
    driver_path: Option<PathBuf>,

    /// Run Chrome headless
    #[arg(long)]
    headless: bool,

    /// Stop after this many batches
    #[arg(long)]
    max_batches: Option<usize>,

    /// Resume strategy (heuristic, checkpoint)
    #[arg(long)]
    resume: Option<ResumeMode>,

    /// Add a `complete` column flagging fully extracted rows
    #[arg(long)]
    completeness_column: bool,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(url) = cli.url {
        config.url = url;
    }
    if let Some(output) = cli.output {
        config.output = output;
    }
    if let Some(webdriver) = cli.webdriver {
        config.webdriver_url = webdriver;
    }
    if let Some(driver_path) = cli.driver_path {
        config.driver_path = Some(driver_path);
    }
    if let Some(resume) = cli.resume {
        config.resume = resume;
    }
    if cli.max_batches.is_some() {
        config.max_batches = cli.max_batches;
    }
    config.headless |= cli.headless;
    config.completeness_column |= cli.completeness_column;

    let max_clicks = match cli.max_clicks.or(config.max_clicks) {
        Some(clicks) => clicks,
        None => prompt::read_max_clicks(&mut std::io::stdin().lock(), &mut std::io::stdout())?,
    };

    let cmd = HarvestCommand::new(config);
    match cmd.execute(max_clicks).await {
        Ok(summary) => {
            println!("{}", summary);
            Ok(())
        }
        Err(e) => {
            error!("An error occurred: {:#}", e);
            Err(e)
        }
    }
}
