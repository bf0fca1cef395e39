//! geoharvest - Geogratis catalog harvester
//!
//! Walks the NRCan Geogratis feed and writes bilingual Open Data records as
//! JSON Lines, with an optional CSV audit report of every attempted item.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "geoharvest")]
#[command(about = "Harvest the Geogratis catalog into Open Data records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    quiet: bool,

    /// Config file path (default: ./geoharvest.toml or ~/.config/geoharvest/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Milliseconds to wait between items
    #[arg(long, global = true)]
    delay_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Harvest a single item by id
    One(cmd::one::OneArgs),
    /// Harvest items edited since a date
    Updated(cmd::harvest::UpdatedArgs),
    /// Harvest every item in the feed
    All(cmd::harvest::WalkArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(geoharvest_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug; the spinner shows activity
    //   non-TTY: info unless --debug or --quiet
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = cli.quiet || (is_tty && !cli.debug);
    geoharvest_core::init_logging(quiet, cli.debug, multi)?;

    let mut config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // CLI overrides
    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }
    if let Some(delay) = cli.delay_ms {
        config.geogratis.item_delay_ms = delay;
    }
    geoharvest_core::set_http_config(config.http.to_http_config());

    geoharvest_core::install_signal_handlers().context("Failed to install signal handlers")?;

    match cli.command {
        Command::One(args) => cmd::one::run(args, &config),
        Command::Updated(args) => cmd::harvest::run_updated(args, &config, &progress),
        Command::All(args) => cmd::harvest::run_all(args, &config, &progress),
        Command::Config => {
            cmd::show_config(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}
