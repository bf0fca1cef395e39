//! Harvest orchestration: open sinks, load tables, walk the feed

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use geoharvest_core::{HttpSource, JsonSource, ProgressContext};

use crate::config::{Config, FeedQuery, Lang};
use crate::emit::{JsonLinesEmitter, OutputStyle};
use crate::feed::{FeedWalker, ItemOutcome, Outputs, WalkSummary};
use crate::lookup::LookupTables;
use crate::report::ReportWriter;
use crate::state::CursorStore;

/// Destination of accepted records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordTarget {
    Stdout,
    File(PathBuf),
    /// Records are transformed and reported but not written anywhere
    Suppressed,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub records: RecordTarget,
    /// Pretty on stdout, compact in a file unless set
    pub style: Option<OutputStyle>,
    pub report: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            records: RecordTarget::Stdout,
            style: None,
            report: None,
        }
    }
}

type RecordSink = Box<dyn Write>;

fn open_records(options: &RunOptions) -> Result<Option<JsonLinesEmitter<RecordSink>>> {
    let (out, default_style): (RecordSink, _) = match &options.records {
        RecordTarget::Suppressed => return Ok(None),
        RecordTarget::Stdout => (Box::new(std::io::stdout().lock()), OutputStyle::Pretty),
        RecordTarget::File(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create output file {}", path.display()))?;
            (Box::new(BufWriter::new(file)), OutputStyle::Compact)
        }
    };
    let style = options.style.unwrap_or(default_style);
    Ok(Some(JsonLinesEmitter::new(out, style)))
}

fn open_outputs(options: &RunOptions) -> Result<Outputs<RecordSink, File>> {
    let records = open_records(options)?;
    let report = options
        .report
        .as_deref()
        .map(ReportWriter::create)
        .transpose()?;
    Ok(Outputs::new(records, report))
}

/// Walk the live Geogratis feed
pub fn run(
    config: &Config,
    query: &FeedQuery,
    options: &RunOptions,
    progress: &ProgressContext,
) -> Result<WalkSummary> {
    run_with(&HttpSource, config, query, options, progress)
}

/// Walk a feed served by `source`
pub fn run_with<S: JsonSource>(
    source: &S,
    config: &Config,
    query: &FeedQuery,
    options: &RunOptions,
    progress: &ProgressContext,
) -> Result<WalkSummary> {
    let tables = LookupTables::load(config.lookups.as_deref())?;
    let cursor = CursorStore::new(&config.state_file);
    let walker = FeedWalker::new(source, config, &tables, &cursor).with_progress(progress);

    // Cursor problems must not cost the previous run's output files
    let start = walker.starting_url(query)?;
    let mut outputs = open_outputs(options)?;
    let summary = walker.walk_from(start, &mut outputs)?;

    if let Some(records) = &outputs.records {
        log::debug!("{} records written", records.written());
    }
    if let Some(report) = outputs.report {
        log::info!("{} report rows written", report.rows());
        report.into_inner()?;
    }
    Ok(summary)
}

/// Harvest a single item by id, bypassing the feed and the cursor
pub fn run_one<S: JsonSource>(
    source: &S,
    config: &Config,
    id: &str,
    options: &RunOptions,
) -> Result<ItemOutcome> {
    let tables = LookupTables::load(config.lookups.as_deref())?;
    let cursor = CursorStore::new(&config.state_file);
    let mut outputs = open_outputs(options)?;

    let walker = FeedWalker::new(source, config, &tables, &cursor);
    let outcome = walker.harvest_item(id, &mut outputs)?;
    if let Some(report) = outputs.report {
        report.into_inner()?;
    }
    Ok(outcome)
}

/// Write the untransformed English document of one item
pub fn print_raw<S: JsonSource>(
    source: &S,
    config: &Config,
    id: &str,
    options: &RunOptions,
) -> Result<()> {
    let url = config.item_url(id, Lang::En);
    let doc = source
        .fetch_json(&url)
        .with_context(|| format!("Cannot fetch {url}"))?;
    if let Some(mut records) = open_records(options)? {
        records.emit(&doc)?;
    }
    Ok(())
}
