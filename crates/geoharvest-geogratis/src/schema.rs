//! Geogratis feed/item documents and the Open Data target record

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// === Fixed target boilerplate ===

pub const AUTHOR_EMAIL: &str = "open-ouvert@tbs-sct.gc.ca";
pub const LANGUAGE: &str = "eng; CAN | fra; CAN";
pub const OWNER_ORG: &str = "nrcan-rncan";
pub const DEPARTMENT_NUMBER: &str = "115";
pub const CATALOG_TYPE: &str = "Geo Data | Géo";
pub const LICENSE_ID: &str = "ca-ogl-lgo";
pub const ATTRIBUTION: &str =
    "Contains information licensed under the Open Government Licence – Canada.";
pub const ATTRIBUTION_FRA: &str =
    "Contient des informations autorisées sous la Licence du gouvernement ouvert- Canada";
pub const SPATIAL_REPRESENTATION_TYPE: &str = "Vector | Vecteur";
pub const MAINTENANCE_FREQUENCY: &str = "As Needed | Au besoin";
pub const ENDPOINT_URL: &str = "http://geogratis.gc.ca/api/en";
pub const ENDPOINT_URL_FRA: &str = "http://geogratis.gc.ca/api/fr";

/// Deserialize `null` as the type's default (upstream sends `null` for empty lists)
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Text that reads as absent unless upstream sent a JSON string
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

/// Nested object that reads as absent if it has the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).ok())
}

/// List whose malformed elements read as defaults, keeping positions intact.
///
/// Anything other than an array is an empty list.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

// === Feed page ===

/// One page of the product feed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedPage {
    #[serde(deserialize_with = "null_as_default")]
    pub products: Vec<ProductStub>,
    #[serde(deserialize_with = "null_as_default")]
    pub links: Vec<Link>,
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductStub {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

impl FeedPage {
    /// `href` of the `rel == "next"` link, if any
    pub fn next_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == "next")
            .map(|l| l.href.as_str())
            .filter(|href| !href.is_empty())
    }

    /// Upstream signals the end of the feed with `count == 0`.
    ///
    /// A page without `count` is exhausted only if it lists nothing.
    pub fn is_exhausted(&self) -> bool {
        match self.count {
            Some(count) => count == 0,
            None => self.products.is_empty(),
        }
    }
}

// === Raw item record (one language variant) ===

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRecord {
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub summary: Option<String>,
    /// Arbitrary nested structure, passed through opaquely
    pub geometry: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    pub citation: Option<Citation>,
    #[serde(deserialize_with = "lenient_vec")]
    pub browse_images: Vec<BrowseImage>,
    #[serde(deserialize_with = "lenient_vec")]
    pub files: Vec<FileEntry>,
    #[serde(deserialize_with = "lenient_vec")]
    pub categories: Vec<Category>,
    #[serde(deserialize_with = "lenient_vec")]
    pub keywords: Vec<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub topic_categories: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub updated_date: Option<String>,
    /// Request URL attached by the fetcher
    #[serde(deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Citation {
    #[serde(deserialize_with = "lenient_string")]
    pub publication_date: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub series: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub series_issue: Option<String>,
    /// Whitespace-separated ISO presentation form codes, e.g. `"mapDigital; documentDigital"`
    #[serde(deserialize_with = "lenient_string")]
    pub presentation_form: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub other_citation_details: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrowseImage {
    #[serde(deserialize_with = "lenient_string")]
    pub link: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
    /// e.g. `"1.25 MB"`
    #[serde(deserialize_with = "lenient_string")]
    pub size: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub file_type: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Category {
    #[serde(rename = "type", deserialize_with = "lenient_text")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_vec")]
    pub terms: Vec<Term>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Term {
    #[serde(deserialize_with = "lenient_string")]
    pub term: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub label: Option<String>,
}

impl RawRecord {
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Terms of every category whose type tag equals `kind`, in document order
    pub fn terms_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Term> + 'a {
        self.categories
            .iter()
            .filter(move |c| c.kind == kind)
            .flat_map(|c| c.terms.iter())
    }
}

// === Target record ===

/// One distribution of a dataset in the target catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceEntry {
    pub name: String,
    pub name_fra: String,
    pub url: String,
    pub size: u64,
    pub format: String,
    pub language: &'static str,
}

/// Normalized Open Data catalog record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetRecord {
    pub id: String,
    pub name: &'static str,
    pub title: String,
    pub title_fra: String,
    pub notes: String,
    pub notes_fra: String,
    pub author_email: &'static str,
    pub language: &'static str,
    pub owner_org: &'static str,
    pub department_number: &'static str,
    pub catalog_type: &'static str,
    pub subject: Vec<String>,
    pub topic_category: Vec<String>,
    pub keywords: String,
    pub keywords_fra: String,
    pub license_id: &'static str,
    pub attribution: &'static str,
    pub attribution_fra: &'static str,
    pub geographic_region: String,
    pub spatial: String,
    pub date_published: String,
    pub spatial_representation_type: &'static str,
    pub presentation_form: String,
    pub browse_graphic_url: String,
    pub date_modified: String,
    pub maintenance_and_update_frequency: &'static str,
    pub data_series_name: String,
    pub data_series_name_fra: String,
    pub data_series_issue_identification: String,
    pub data_series_issue_identification_fra: String,
    pub digital_object_identifier: String,
    pub time_period_coverage_start: &'static str,
    pub time_period_coverage_end: &'static str,
    pub url: String,
    pub url_fra: String,
    pub endpoint_url: &'static str,
    pub endpoint_url_fra: &'static str,
    pub ready_to_publish: bool,
    pub portal_release_date: &'static str,
    pub resources: Vec<ResourceEntry>,
}
