//! `one` subcommand - harvest or dump a single item

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use geoharvest_core::HttpSource;
use geoharvest_geogratis::ItemOutcome;

use super::OutputArgs;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct OneArgs {
    /// Geogratis product id
    #[arg(short = 'u', long = "id", alias = "uuid")]
    pub id: String,

    /// Print the English document as served instead of transforming it
    #[arg(long)]
    pub raw: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub fn run(args: OneArgs, config: &Config) -> Result<ExitCode> {
    let harvest = config.geogratis.to_harvest_config();
    let options = args.output.run_options(config);

    if args.raw {
        geoharvest_geogratis::print_raw(&HttpSource, &harvest, &args.id, &options)?;
        return Ok(ExitCode::SUCCESS);
    }

    match geoharvest_geogratis::run_one(&HttpSource, &harvest, &args.id, &options)? {
        ItemOutcome::Emitted => Ok(ExitCode::SUCCESS),
        ItemOutcome::Excluded => {
            log::warn!("{}: product type is excluded from harvesting", args.id);
            Ok(ExitCode::SUCCESS)
        }
        ItemOutcome::Rejected { reasons } => {
            log::warn!("{}: rejected: {reasons}", args.id);
            Ok(ExitCode::FAILURE)
        }
        ItemOutcome::Skipped => {
            log::error!("{}: English record unavailable", args.id);
            Ok(ExitCode::FAILURE)
        }
    }
}
