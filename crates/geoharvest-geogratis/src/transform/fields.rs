//! Per-field extraction from a raw record.
//!
//! Each function answers "present or absent" for one field; defaults are
//! applied by the caller so absence stays visible for validation and reporting.

use serde_json::Value;

use crate::lookup::LookupTables;
use crate::schema::RawRecord;

/// Category type carrying the product series (used for exclusion)
pub const PRODUCT_TYPE_CATEGORY: &str = "urn:iso:series";
/// Category type carrying place names
pub const PLACE_CATEGORY: &str = "urn:iso:place";
/// Place label that stands for the implicit default region
pub const DEFAULT_REGION_LABEL: &str = "Canada";
/// Extension the fetcher's item URLs end with
const JSON_SUFFIX: &str = ".json";

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

pub fn title(record: &RawRecord) -> Option<&str> {
    non_empty(record.title.as_deref())
}

pub fn summary(record: &RawRecord) -> Option<&str> {
    non_empty(record.summary.as_deref())
}

pub fn publication_date(record: &RawRecord) -> Option<&str> {
    non_empty(record.citation.as_ref()?.publication_date.as_deref())
}

pub fn series(record: &RawRecord) -> Option<&str> {
    non_empty(record.citation.as_ref()?.series.as_deref())
}

pub fn series_issue(record: &RawRecord) -> Option<&str> {
    non_empty(record.citation.as_ref()?.series_issue.as_deref())
}

/// DOI or similar, carried in the citation's other-details field
pub fn external_identifier(record: &RawRecord) -> Option<&str> {
    non_empty(record.citation.as_ref()?.other_citation_details.as_deref())
}

pub fn browse_graphic(record: &RawRecord) -> Option<&str> {
    non_empty(record.browse_images.first()?.link.as_deref())
}

pub fn modified_date(record: &RawRecord) -> Option<&str> {
    non_empty(record.updated_date.as_deref())
}

/// Presentation form label: the last recognized code in the citation field wins.
pub fn presentation_form<'t>(record: &RawRecord, tables: &'t LookupTables) -> Option<&'t str> {
    let codes = record.citation.as_ref()?.presentation_form.as_deref()?;
    codes
        .split_whitespace()
        .filter_map(|code| tables.presentation_form(code.trim_end_matches(';')))
        .last()
}

/// Region key of the first known place other than Canada
pub fn region<'t>(record: &RawRecord, tables: &'t LookupTables) -> Option<&'t str> {
    record
        .terms_of(PLACE_CATEGORY)
        .filter_map(|t| t.label.as_deref())
        .filter(|label| *label != DEFAULT_REGION_LABEL)
        .find_map(|label| tables.region_key(label))
}

/// Geometry re-serialized with single quotes turned into double quotes.
///
/// A string geometry is taken as already serialized text.
pub fn spatial(record: &RawRecord) -> Option<String> {
    let text = match record.geometry.as_ref()? {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Some(text.replace('\'', "\""))
}

/// Record URL without its `.json` extension
pub fn canonical_url(record: &RawRecord) -> Option<&str> {
    let url = non_empty(record.url.as_deref())?;
    Some(url.strip_suffix(JSON_SUFFIX).unwrap_or(url))
}

/// Series term of the last product-type category
pub fn product_type(record: &RawRecord) -> Option<&str> {
    record
        .categories
        .iter()
        .filter(|c| c.kind == PRODUCT_TYPE_CATEGORY)
        .last()?
        .terms
        .first()?
        .term
        .as_deref()
}
