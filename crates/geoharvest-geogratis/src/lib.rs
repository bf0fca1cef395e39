//! Geoharvest Geogratis - NRCan Geogratis catalog harvester
//!
//! Walks the Geogratis product feed, fetches each product in English and
//! French, and converts the pair into one bilingual open data catalog record.
//! Rejected pairs are listed with their reasons in a CSV audit report.
//!
//! # Example
//!
//! ```no_run
//! use geoharvest_core::ProgressContext;
//! use geoharvest_geogratis::{Config, FeedQuery, RunOptions, run};
//!
//! let config = Config {
//!     max_pages: Some(1),
//!     ..Default::default()
//! };
//! let query = FeedQuery::modified_since("2024-01-01").expect("valid date");
//! let summary = run(&config, &query, &RunOptions::default(), &ProgressContext::hidden())
//!     .expect("Harvest failed");
//! println!("Emitted {} records", summary.emitted);
//! ```

pub mod config;
pub mod emit;
pub mod feed;
pub mod lookup;
pub mod report;
pub mod runner;
pub mod schema;
pub mod state;
pub mod transform;

// Re-exports for convenience
pub use config::{Config, FeedQuery, Lang};
pub use emit::{JsonLinesEmitter, OutputStyle};
pub use feed::{FRENCH_UNAVAILABLE, FeedWalker, ItemOutcome, Outputs, WalkSummary};
pub use lookup::LookupTables;
pub use report::{REPORT_HEADERS, ReportRow, ReportWriter};
pub use runner::{RecordTarget, RunOptions, print_raw, run, run_one, run_with};
pub use schema::{FeedPage, RawRecord, TargetRecord};
pub use state::CursorStore;
pub use transform::transform;
