//! Geogratis harvester configuration

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use reqwest::Url;

/// Language variant of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    En,
    Fr,
}

impl Lang {
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::En => "English",
            Self::Fr => "French",
        })
    }
}

/// Where a fresh walk (no saved cursor) starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedQuery {
    /// Every record in the collection
    All,
    /// Records edited at or after this instant (already ISO-8601 formatted)
    ModifiedSince(String),
}

impl FeedQuery {
    /// Parse an ISO-8601 date or date-time.
    ///
    /// Accepts RFC 3339 with offset, naive date-times (`T` or space separated,
    /// optional fractional seconds) and bare dates (midnight).
    pub fn modified_since(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Self::ModifiedSince(
                dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            ));
        }
        let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .with_context(|| format!("\"{raw}\" is an invalid date"))?;
        Ok(Self::ModifiedSince(
            naive.format("%Y-%m-%dT%H:%M:%S").to_string(),
        ))
    }
}

/// Runtime configuration for a Geogratis harvest
#[derive(Debug, Clone)]
pub struct Config {
    /// API root, e.g. `http://geogratis.gc.ca/api`
    pub base_url: String,
    /// Collection path under the language segment
    pub collection: String,
    /// Pause between items to go easy on upstream
    pub item_delay: Duration,
    /// Stop after this many feed pages
    pub max_pages: Option<usize>,
    /// Forget the saved cursor before starting
    pub reset: bool,
    /// Product types (`urn:iso:series` terms) that are never harvested
    pub excluded_product_types: Vec<String>,
    /// Cursor file
    pub state_file: PathBuf,
    /// Lookup table override; built-in tables when `None`
    pub lookups: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://geogratis.gc.ca/api".to_string(),
            collection: "nrcan-rncan/ess-sst".to_string(),
            item_delay: Duration::from_millis(200),
            max_pages: None,
            reset: false,
            excluded_product_types: vec!["canadian-digital-elevation-data".to_string()],
            state_file: PathBuf::from("geoharvest-state.toml"),
            lookups: None,
        }
    }
}

impl Config {
    fn collection_url(&self, lang: Lang) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            lang.code(),
            self.collection.trim_matches('/')
        )
    }

    /// First feed page for `query`
    pub fn feed_url(&self, query: &FeedQuery) -> Result<String> {
        let base = self.collection_url(Lang::En);
        let url = match query {
            FeedQuery::All => Url::parse_with_params(&base, [("alt", "json")]),
            FeedQuery::ModifiedSince(since) => Url::parse_with_params(
                &base,
                [("alt", "json"), ("edited-min", since.as_str())],
            ),
        }
        .with_context(|| format!("Invalid feed URL {base}"))?;
        Ok(url.into())
    }

    /// Detail document of one item in one language
    pub fn item_url(&self, id: &str, lang: Lang) -> String {
        format!("{}/{id}.json", self.collection_url(lang))
    }

    pub fn is_excluded(&self, product_type: &str) -> bool {
        self.excluded_product_types
            .iter()
            .any(|t| t == product_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.base_url.starts_with("http://"));
        assert!(config.max_pages.is_none());
        assert!(!config.reset);
        assert!(config.is_excluded("canadian-digital-elevation-data"));
        assert!(!config.is_excluded("topographic-maps"));
    }

    #[test]
    fn all_records_url() {
        let config = Config::default();
        assert_eq!(
            config.feed_url(&FeedQuery::All).unwrap(),
            "http://geogratis.gc.ca/api/en/nrcan-rncan/ess-sst?alt=json"
        );
    }

    #[test]
    fn modified_since_url_encodes_offset() {
        let config = Config::default();
        let query = FeedQuery::modified_since("2013-01-30T01:30:00+05:00").unwrap();
        let url = config.feed_url(&query).unwrap();
        assert_eq!(
            url,
            "http://geogratis.gc.ca/api/en/nrcan-rncan/ess-sst?alt=json&edited-min=2013-01-30T01%3A30%3A00%2B05%3A00"
        );
    }

    #[test]
    fn item_urls_per_language() {
        let config = Config {
            base_url: "http://geo.test/api/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.item_url("abc", Lang::En),
            "http://geo.test/api/en/nrcan-rncan/ess-sst/abc.json"
        );
        assert_eq!(
            config.item_url("abc", Lang::Fr),
            "http://geo.test/api/fr/nrcan-rncan/ess-sst/abc.json"
        );
    }

    #[test]
    fn parse_since_variants() {
        assert_eq!(
            FeedQuery::modified_since("2013-01-30T01:30:00").unwrap(),
            FeedQuery::ModifiedSince("2013-01-30T01:30:00".to_string())
        );
        assert_eq!(
            FeedQuery::modified_since("2013-01-30").unwrap(),
            FeedQuery::ModifiedSince("2013-01-30T00:00:00".to_string())
        );
        assert_eq!(
            FeedQuery::modified_since("2013-01-30 01:30:00.250").unwrap(),
            FeedQuery::ModifiedSince("2013-01-30T01:30:00".to_string())
        );
        assert_eq!(
            FeedQuery::modified_since("2013-01-30T01:30:00Z").unwrap(),
            FeedQuery::ModifiedSince("2013-01-30T01:30:00+00:00".to_string())
        );
    }

    #[test]
    fn parse_since_invalid() {
        for raw in ["yesterday", "2013-13-01", "30/01/2013", ""] {
            let err = FeedQuery::modified_since(raw).unwrap_err();
            assert!(err.to_string().contains("invalid date"), "{raw}");
        }
    }
}
