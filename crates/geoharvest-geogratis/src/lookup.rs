//! Static vocabulary tables consulted by the transformer
//!
//! Loaded once per run from TOML (built-in copy or a user file) and only read
//! afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Lookup data compiled into the binary
const BUILTIN_LOOKUPS: &str = include_str!("../data/lookups.toml");

/// Format key for file types missing from the format table
pub const OTHER_FORMAT: &str = "Other";

/// Topic choice in the target schema
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicChoice {
    pub key: String,
    #[serde(default)]
    pub subjects: Vec<String>,
}

/// Rewrites applied around camel-case splitting of raw topic tokens
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopicExceptions {
    /// Raw token -> schema label, checked before splitting
    pub literal: BTreeMap<String, String>,
    /// Split + title-cased label -> schema label
    pub normalized: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LookupTables {
    pub topics: BTreeMap<String, TopicChoice>,
    pub topic_exceptions: TopicExceptions,
    pub formats: BTreeMap<String, String>,
    pub regions: BTreeMap<String, String>,
    pub presentation_forms: BTreeMap<String, String>,
}

impl LookupTables {
    /// Tables shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_LOOKUPS).context("built-in lookup tables are invalid")
    }

    /// Load from `path` if given, else the built-in tables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lookup tables: {}", path.display()))?;
        let tables = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse lookup tables: {}", path.display()))?;
        log::info!("Loaded lookup tables from {}", path.display());
        Ok(tables)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let tables: Self = toml::from_str(s)?;
        anyhow::ensure!(!tables.topics.is_empty(), "lookup tables define no topics");
        log::debug!(
            "Lookup tables: {} topics, {} formats, {} regions, {} presentation forms",
            tables.topics.len(),
            tables.formats.len(),
            tables.regions.len(),
            tables.presentation_forms.len()
        );
        Ok(tables)
    }

    pub fn topic(&self, label: &str) -> Option<&TopicChoice> {
        self.topics.get(label)
    }

    /// Exact-match format key; anything unknown is [`OTHER_FORMAT`].
    pub fn format_key(&self, file_type: &str) -> &str {
        self.formats
            .get(file_type)
            .map(String::as_str)
            .unwrap_or(OTHER_FORMAT)
    }

    pub fn region_key(&self, label: &str) -> Option<&str> {
        self.regions.get(label).map(String::as_str)
    }

    pub fn presentation_form(&self, code: &str) -> Option<&str> {
        self.presentation_forms.get(code).map(String::as_str)
    }
}
