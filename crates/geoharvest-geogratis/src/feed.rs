//! Feed walker: pages through the product feed and harvests every listed item.
//!
//! Strictly sequential. Items of a page are handled in listed order, then the
//! page's `next` link is persisted as the cursor, so a crash resumes after the
//! last completed page.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use geoharvest_core::{FetchError, JsonSource, ProgressContext, fmt_num, shutdown_flag};
use indicatif::ProgressBar;

use crate::config::{Config, FeedQuery, Lang};
use crate::emit::JsonLinesEmitter;
use crate::lookup::LookupTables;
use crate::report::{ReportRow, ReportWriter};
use crate::schema::{FeedPage, RawRecord};
use crate::state::CursorStore;
use crate::transform::{fields, transform};

/// Report reason when only the English variant could be fetched
pub const FRENCH_UNAVAILABLE: &str = "Unable to retrieve French record";

/// Output sinks. `None` disables that sink entirely.
pub struct Outputs<O: Write, R: Write> {
    pub records: Option<JsonLinesEmitter<O>>,
    pub report: Option<ReportWriter<R>>,
}

impl<O: Write, R: Write> Outputs<O, R> {
    pub fn new(records: Option<JsonLinesEmitter<O>>, report: Option<ReportWriter<R>>) -> Self {
        Self { records, report }
    }

    fn report(&mut self, row: &ReportRow) -> Result<()> {
        match self.report.as_mut() {
            Some(report) => report.write_row(row),
            None => Ok(()),
        }
    }
}

/// What happened to one listed item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Transformed and written to the record output
    Emitted,
    /// Failed validation or French variant unavailable
    Rejected { reasons: String },
    /// English variant unavailable
    Skipped,
    /// Product type configured as excluded
    Excluded,
}

/// Counters for one walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub pages: usize,
    pub items: usize,
    pub emitted: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub excluded: usize,
    /// Stopped early on a shutdown request
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl WalkSummary {
    pub fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Emitted => self.emitted += 1,
            ItemOutcome::Rejected { .. } => self.rejected += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Excluded => self.excluded += 1,
        }
    }

    pub fn log(&self) {
        log::info!("=== Harvest Summary ===");
        log::info!(
            "Pages: {}, items: {} ({} emitted, {} rejected, {} skipped, {} excluded)",
            fmt_num(self.pages),
            fmt_num(self.items),
            fmt_num(self.emitted),
            fmt_num(self.rejected),
            fmt_num(self.skipped),
            fmt_num(self.excluded)
        );
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
        if self.interrupted {
            log::warn!("Interrupted; cursor still points at the unfinished page");
        }
    }
}

pub struct FeedWalker<'a, S: JsonSource> {
    source: &'a S,
    config: &'a Config,
    tables: &'a LookupTables,
    cursor: &'a CursorStore,
    stop: &'a AtomicBool,
    status: ProgressBar,
}

impl<'a, S: JsonSource> FeedWalker<'a, S> {
    pub fn new(
        source: &'a S,
        config: &'a Config,
        tables: &'a LookupTables,
        cursor: &'a CursorStore,
    ) -> Self {
        Self {
            source,
            config,
            tables,
            cursor,
            stop: shutdown_flag(),
            status: ProgressBar::hidden(),
        }
    }

    /// Watch `flag` instead of the process-wide shutdown flag.
    pub fn with_stop_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.stop = flag;
        self
    }

    /// Show a status spinner while walking.
    pub fn with_progress(mut self, progress: &ProgressContext) -> Self {
        self.status = progress.status_line("geogratis");
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// First URL to fetch: the saved cursor, or `query` when there is none or
    /// the config asks for a reset.
    ///
    /// Cursor file errors surface here, before any request goes out.
    pub fn starting_url(&self, query: &FeedQuery) -> Result<String> {
        if self.config.reset {
            log::info!("Resetting cursor {}", self.cursor.path().display());
            self.cursor.clear()?;
            return self.config.feed_url(query);
        }
        match self.cursor.load()? {
            Some(link) => {
                log::info!("Resuming from saved cursor {link}");
                Ok(link)
            }
            None => self.config.feed_url(query),
        }
    }

    /// Walk the feed from the start chosen by [`Self::starting_url`].
    pub fn walk<O: Write, R: Write>(
        &self,
        query: &FeedQuery,
        outputs: &mut Outputs<O, R>,
    ) -> Result<WalkSummary> {
        let start = self.starting_url(query)?;
        self.walk_from(start, outputs)
    }

    /// Walk the feed from `url` until it is exhausted, `max_pages` is reached
    /// or a shutdown is requested.
    ///
    /// A failed feed page fetch ends the walk with an error; output already
    /// written stays as it is.
    pub fn walk_from<O: Write, R: Write>(
        &self,
        mut url: String,
        outputs: &mut Outputs<O, R>,
    ) -> Result<WalkSummary> {
        let start = Instant::now();
        let mut summary = WalkSummary::default();

        let finished = loop {
            if self.stop_requested() {
                break false;
            }

            self.status
                .set_message(format!("page {}: fetching", summary.pages + 1));
            log::info!("Fetching feed page {}: {url}", summary.pages + 1);
            let page = self.fetch_page(&url).map_err(|e| {
                log::error!("Feed page {url} failed: {e}");
                e
            });
            let page = page.with_context(|| format!("Feed walk stopped at {url}"))?;
            summary.pages += 1;

            if page.is_exhausted() {
                log::info!("Feed exhausted after {} pages", summary.pages);
                self.cursor.clear()?;
                break true;
            }

            for stub in &page.products {
                if self.stop_requested() {
                    break;
                }
                if summary.items > 0 && !self.config.item_delay.is_zero() {
                    std::thread::sleep(self.config.item_delay);
                }
                summary.items += 1;
                self.status.set_message(format!(
                    "page {}: item {} ({} emitted)",
                    summary.pages,
                    fmt_num(summary.items),
                    fmt_num(summary.emitted)
                ));
                let outcome = self.harvest_item(&stub.id, outputs)?;
                summary.record(outcome);
            }
            if self.stop_requested() {
                break false;
            }

            match page.next_link() {
                Some(next) => {
                    self.cursor.save(next)?;
                    url = next.to_string();
                }
                None => {
                    log::info!("No next page; feed finished");
                    self.cursor.clear()?;
                    break true;
                }
            }

            if self
                .config
                .max_pages
                .is_some_and(|max| summary.pages >= max)
            {
                log::info!("Reached page limit ({})", summary.pages);
                break true;
            }
        };

        self.status.finish_and_clear();
        summary.interrupted = !finished;
        summary.elapsed = start.elapsed();
        Ok(summary)
    }

    fn fetch_page(&self, url: &str) -> Result<FeedPage, FetchError> {
        let doc = self.source.fetch_json(url)?;
        serde_json::from_value(doc).map_err(|e| FetchError::Parse(format!("feed page: {e}")))
    }

    /// Fetch one language variant of an item.
    pub fn fetch_record(&self, id: &str, lang: Lang) -> Result<RawRecord, FetchError> {
        let doc = self.source.fetch_json(&self.config.item_url(id, lang))?;
        RawRecord::from_value(doc).map_err(|e| FetchError::Parse(format!("{lang} record {id}: {e}")))
    }

    /// Fetch, transform and route a single item.
    ///
    /// Fetch failures and validation failures are outcomes, not errors; only
    /// output write failures are returned as `Err`.
    pub fn harvest_item<O: Write, R: Write>(
        &self,
        id: &str,
        outputs: &mut Outputs<O, R>,
    ) -> Result<ItemOutcome> {
        let en = match self.fetch_record(id, Lang::En) {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                log::warn!("Skipping {id}: no English record upstream ({e})");
                return Ok(ItemOutcome::Skipped);
            }
            Err(e) => {
                log::warn!("Skipping {id}: English record unavailable ({e})");
                return Ok(ItemOutcome::Skipped);
            }
        };

        if let Some(product_type) =
            fields::product_type(&en).filter(|t| self.config.is_excluded(t))
        {
            log::debug!("Excluding {id}: product type {product_type}");
            return Ok(ItemOutcome::Excluded);
        }

        let fr = match self.fetch_record(id, Lang::Fr) {
            Ok(record) => record,
            Err(e) => {
                if e.is_not_found() {
                    log::warn!("{FRENCH_UNAVAILABLE} for {id}: no French record upstream ({e})");
                } else {
                    log::warn!("{FRENCH_UNAVAILABLE} for {id} ({e})");
                }
                outputs.report(&ReportRow::rejected(
                    id,
                    fields::title(&en).unwrap_or_default(),
                    FRENCH_UNAVAILABLE,
                ))?;
                return Ok(ItemOutcome::Rejected {
                    reasons: FRENCH_UNAVAILABLE.to_string(),
                });
            }
        };

        let (record, row) = transform(&en, &fr, self.tables);
        outputs.report(&row)?;
        match record {
            Some(record) => {
                if let Some(records) = outputs.records.as_mut() {
                    records.emit(&record)?;
                }
                log::debug!("Accepted {id}");
                Ok(ItemOutcome::Emitted)
            }
            None => {
                let reasons = row.reasons_text();
                log::debug!("Rejected {id}: {reasons}");
                Ok(ItemOutcome::Rejected { reasons })
            }
        }
    }
}
