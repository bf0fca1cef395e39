//! Keyword extraction and punctuation cleanup

use std::sync::LazyLock;

use regex::Regex;

use crate::schema::RawRecord;

/// Separator between levels of a hierarchical keyword (`"Earth Sciences > Geology"`)
pub const HIERARCHY_SEPARATOR: char = '>';

/// Category type whose term labels double as keywords
pub const GC_SUBJECT_CATEGORY: &str = "urn:gc:subject";

static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]*)\)").expect("invalid parenthesis regex"));
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]*)\]").expect("invalid bracket regex"));

/// Most specific level of a hierarchical keyword
pub fn last_segment(keyword: &str) -> &str {
    keyword
        .rsplit(HIERARCHY_SEPARATOR)
        .next()
        .unwrap_or(keyword)
}

/// Trim and rewrite `/`, `(x)` and `[x]` into the catalog's ` - ` convention.
///
/// Nested groups are rewritten until none remain, so cleaning is idempotent.
pub fn clean_keyword(raw: &str) -> String {
    let mut s = raw.trim().replace('/', " - ");
    loop {
        let next = PARENTHESIZED.replace_all(&s, "- $1");
        let next = BRACKETED.replace_all(&next, "- $1").into_owned();
        if next == s {
            break;
        }
        s = next;
    }
    s.trim().to_string()
}

/// Comma-joined keywords of one language variant.
///
/// Hierarchical keywords contribute their last segment; GC subject term labels
/// are appended after them. Duplicates are kept, empties dropped.
pub fn extract_keywords(record: &RawRecord) -> String {
    let from_keywords = record
        .keywords
        .iter()
        .map(|k| clean_keyword(last_segment(k)));
    let from_subjects = record
        .terms_of(GC_SUBJECT_CATEGORY)
        .filter_map(|t| t.label.as_deref())
        .map(clean_keyword);

    from_keywords
        .chain(from_subjects)
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
