//! ISO topic tokens -> catalog topic and subject keys

use std::sync::LazyLock;

use regex::Regex;

use crate::lookup::{LookupTables, TopicExceptions};

/// Lower-to-upper case boundary inside a camel-case token
static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("invalid camel-case regex"));

/// Topic and subject keys derived from one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicsSubjects {
    pub topics: Vec<String>,
    pub subjects: Vec<String>,
}

/// Capitalize the first letter of every alphabetic run and lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Turn a raw Geogratis topic token into a schema topic label.
///
/// `planningCadastre`-style tokens with no mechanical mapping come from the
/// literal exception table; everything else is split at camel-case boundaries,
/// title-cased, then passed through the normalized exception table.
pub fn normalize_topic(token: &str, exceptions: &TopicExceptions) -> String {
    if let Some(label) = exceptions.literal.get(token) {
        return label.clone();
    }
    let spaced = CAMEL_BOUNDARY.replace_all(token, "$1 $2");
    let label = title_case(&spaced);
    match exceptions.normalized.get(&label) {
        Some(rewritten) => rewritten.clone(),
        None => label,
    }
}

/// Map raw topic tokens through the topic table.
///
/// Unknown tokens are dropped. Subject keys keep first-seen order without repeats.
pub fn map_topics(tokens: &[String], tables: &LookupTables) -> TopicsSubjects {
    let mut out = TopicsSubjects::default();
    for token in tokens {
        let label = normalize_topic(token, &tables.topic_exceptions);
        let Some(choice) = tables.topic(&label) else {
            log::debug!("Dropping unknown topic category {token:?} ({label:?})");
            continue;
        };
        out.topics.push(choice.key.clone());
        for subject in &choice.subjects {
            if !out.subjects.contains(subject) {
                out.subjects.push(subject.clone());
            }
        }
    }
    out
}
