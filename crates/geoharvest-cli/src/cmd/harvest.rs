//! `updated` and `all` subcommands - walk the Geogratis feed

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use clap::builder::RangedU64ValueParser;

use geoharvest_core::{SharedProgress, fmt_num};
use geoharvest_geogratis::{FeedQuery, WalkSummary};

use super::{OutputArgs, print_table};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct WalkArgs {
    /// Stop after this many feed pages
    #[arg(short, long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub max_pages: Option<usize>,

    /// Forget the saved cursor and start from the first page
    #[arg(long)]
    pub reset: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct UpdatedArgs {
    /// Only records edited since this ISO-8601 date or date-time
    #[arg(short, long)]
    pub date: String,

    #[command(flatten)]
    pub walk: WalkArgs,
}

pub fn run_updated(args: UpdatedArgs, config: &Config, progress: &SharedProgress) -> Result<ExitCode> {
    // Bad dates fail here, before any request
    let query = FeedQuery::modified_since(&args.date)?;
    walk(&query, args.walk, config, progress)
}

pub fn run_all(args: WalkArgs, config: &Config, progress: &SharedProgress) -> Result<ExitCode> {
    walk(&FeedQuery::All, args, config, progress)
}

fn walk(
    query: &FeedQuery,
    args: WalkArgs,
    config: &Config,
    progress: &SharedProgress,
) -> Result<ExitCode> {
    let harvest = geoharvest_geogratis::Config {
        max_pages: args.max_pages,
        reset: args.reset,
        ..config.geogratis.to_harvest_config()
    };
    let options = args.output.run_options(config);

    log::info!("Harvesting Geogratis ({query:?})");
    log::info!("  Cursor: {}", harvest.state_file.display());
    if let Some(report) = &options.report {
        log::info!("  Report: {}", report.display());
    }

    let summary = geoharvest_geogratis::run(&harvest, query, &options, progress)?;

    if progress.is_tty() {
        print_summary(&summary);
    } else {
        summary.log();
    }

    if summary.interrupted {
        log::warn!("Interrupted; rerun to resume from the saved cursor");
        return Ok(ExitCode::from(130));
    }
    Ok(ExitCode::SUCCESS)
}

fn print_summary(summary: &WalkSummary) {
    print_table(
        "Geogratis",
        &[
            ("Pages", fmt_num(summary.pages)),
            ("Items", fmt_num(summary.items)),
            ("Emitted", fmt_num(summary.emitted)),
            ("Rejected", fmt_num(summary.rejected)),
            ("Skipped", fmt_num(summary.skipped)),
            ("Excluded", fmt_num(summary.excluded)),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );
}
