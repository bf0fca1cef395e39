//! Audit report: one CSV row per attempted item

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Column headers, in output order
pub const REPORT_HEADERS: [&str; 15] = [
    "ID",
    "Pass or Fail",
    "Title (EN)",
    "Title (FR)",
    "Summary (EN)",
    "Summary (FR)",
    "Topic Categories",
    "Keywords",
    "Published Date",
    "Browse Images",
    "Series (EN)",
    "Series (FR)",
    "Series Issue (EN)",
    "Series Issue (FR)",
    "Reason for Failure",
];

/// Outcome of one attempted item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRow {
    pub id: String,
    pub passed: bool,
    pub title_en: String,
    pub title_fr: String,
    pub summary_en: bool,
    pub summary_fr: bool,
    pub topics: bool,
    pub keywords: bool,
    pub published_date: bool,
    pub browse_image: bool,
    pub series_en: bool,
    pub series_fr: bool,
    pub series_issue_en: bool,
    pub series_issue_fr: bool,
    pub reasons: Vec<String>,
}

fn flag(present: bool) -> &'static str {
    if present { "Y" } else { "N" }
}

impl ReportRow {
    /// Failing row for an item that never reached the transformer
    pub fn rejected(id: &str, title_en: &str, reason: &str) -> Self {
        Self {
            id: id.to_string(),
            title_en: title_en.to_string(),
            reasons: vec![reason.to_string()],
            ..Default::default()
        }
    }

    pub fn reasons_text(&self) -> String {
        self.reasons.join("; ")
    }

    /// True if any reason mentions `needle`
    pub fn has_reason(&self, needle: &str) -> bool {
        self.reasons.iter().any(|r| r.contains(needle))
    }

    fn to_record(&self) -> [String; 15] {
        [
            self.id.clone(),
            if self.passed { "Pass" } else { "Fail" }.to_string(),
            self.title_en.clone(),
            self.title_fr.clone(),
            flag(self.summary_en).to_string(),
            flag(self.summary_fr).to_string(),
            flag(self.topics).to_string(),
            flag(self.keywords).to_string(),
            flag(self.published_date).to_string(),
            flag(self.browse_image).to_string(),
            flag(self.series_en).to_string(),
            flag(self.series_fr).to_string(),
            flag(self.series_issue_en).to_string(),
            flag(self.series_issue_fr).to_string(),
            self.reasons_text(),
        ]
    }
}

/// Append-only CSV writer. Header goes out on creation; every row is flushed.
pub struct ReportWriter<W: Write> {
    inner: csv::Writer<W>,
    rows: usize,
}

impl ReportWriter<File> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Cannot create report file {}", path.display()))?;
        Self::new(file)
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(writer: W) -> Result<Self> {
        let mut inner = csv::Writer::from_writer(writer);
        inner
            .write_record(REPORT_HEADERS)
            .context("Failed to write report header")?;
        inner.flush()?;
        Ok(Self { inner, rows: 0 })
    }

    pub fn write_row(&mut self, row: &ReportRow) -> Result<()> {
        self.inner
            .write_record(row.to_record())
            .with_context(|| format!("Failed to write report row for {}", row.id))?;
        self.inner.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far (header excluded)
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush report: {}", e.error()))
    }
}
