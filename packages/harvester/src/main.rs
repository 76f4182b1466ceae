//! CLI entry point for the harvester.

use clap::Parser;
use statute_harvester::cli::{self, Cli};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // WARN by default (INFO with --verbose), respecting RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
