//! Binary crate for the `weather-dashboard` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and setting up logging
//! - The interactive search / card dashboard
//! - Rendering forecast series as terminal charts

use clap::Parser;
use dashboard_core::Config;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod interactive;
mod render;

const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter_from_verbosity(cmd.verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;
    cmd.run(config).await
}
