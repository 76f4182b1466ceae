//! Command-line interface for the harvester.

use std::path::{Path, PathBuf};

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{
    HarvestConfig, ListingMode, DEFAULT_BASE_URL, DEFAULT_OUTPUT_DIR, DEFAULT_PAGE_SIZE,
    MAX_LISTING_PAGES,
};
use crate::error::Result;
use crate::harvester::{Harvester, RunOptions, RunStats};
use crate::http::RateLimitedTransport;

/// Statute Harvester - Download statutes from the legal portal into seed records.
#[derive(Parser, Debug)]
#[command(name = "statute-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Process at most N acts (smoke testing)
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Reuse the cached index instead of crawling the listing again
    #[arg(long)]
    pub skip_discovery: bool,

    /// Output directory for the index and seed files
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Portal base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Listing markup to crawl: table or list
    #[arg(long, default_value_t = ListingMode::Table)]
    pub listing: ListingMode,

    /// Entries requested per listing page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Upper bound on listing pages fetched
    #[arg(long, default_value_t = MAX_LISTING_PAGES)]
    pub max_pages: u32,

    /// Harvest acts with a placeholder seed again
    #[arg(long)]
    pub retry_placeholders: bool,

    /// Log progress at info level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is not set.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "info"
        } else {
            "warn"
        }
    }

    #[must_use]
    pub fn config(&self) -> HarvestConfig {
        HarvestConfig::default()
            .with_base_url(self.base_url.as_str())
            .with_listing_mode(self.listing)
            .with_page_size(self.page_size)
            .with_max_pages(self.max_pages)
            .with_output_dir(self.output.as_path())
    }

    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            limit: self.limit,
            skip_discovery: self.skip_discovery,
            retry_placeholders: self.retry_placeholders,
        }
    }
}

/// Run the CLI with parsed arguments.
pub fn run(cli: &Cli) -> Result<()> {
    let config = cli.config();
    config.validate()?;
    let output = config.output_dir.clone();

    println!(
        "{} statutes from {} ({} listing)",
        style("Harvesting").bold(),
        style(&config.base_url).cyan(),
        config.listing_mode
    );
    println!();

    let transport = RateLimitedTransport::new(&config)?;
    let harvester = Harvester::new(&transport, config)?.with_progress(progress_bar());
    let stats = harvester.run(&cli.run_options())?;

    print_summary(&stats, &output);
    Ok(())
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("=> "),
    );
    pb
}

fn print_summary(stats: &RunStats, output: &Path) {
    println!("  Processed: {}", style(stats.processed).green());
    println!("  Skipped: {}", stats.skipped);
    if stats.failed > 0 {
        println!("  Failed: {}", style(stats.failed).yellow().bold());
    } else {
        println!("  Failed: 0");
    }
    println!("  Provisions: {}", stats.provisions);
    println!();
    println!("{} {}", style("Saved to:").green().bold(), output.display());
}
