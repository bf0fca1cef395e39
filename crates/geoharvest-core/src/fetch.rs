//! Blocking JSON fetches over a shared async HTTP client.
//!
//! Uses async reqwest on a private tokio runtime but presents a sync interface:
//! the harvester walks the feed strictly sequentially.

use std::sync::{LazyLock, OnceLock};
use std::time::Duration;

use serde_json::Value;

use crate::error::FetchError;

/// Key under which the requesting URL is attached to every fetched document
pub const URL_KEY: &str = "url";

/// HTTP settings applied when the shared client is first built
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout (connect + headers + body)
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("geoharvest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

static HTTP_CONFIG: OnceLock<HttpConfig> = OnceLock::new();

/// Install HTTP settings. Must run before the first fetch; later calls are ignored.
pub fn set_http_config(config: HttpConfig) {
    if HTTP_CONFIG.set(config).is_err() {
        log::debug!("HTTP config already set, ignoring override");
    }
}

/// Active HTTP settings (defaults if never set)
pub fn http_config() -> &'static HttpConfig {
    HTTP_CONFIG.get_or_init(HttpConfig::default)
}

static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    let config = http_config();
    reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Runtime driving the async client; one worker is plenty for a sequential walk.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Anything that can turn a URL into a parsed JSON document.
///
/// The feed walker only talks to this trait so it can be driven by canned
/// documents in tests.
pub trait JsonSource {
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// Live HTTP implementation backed by the shared client
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpSource;

impl JsonSource for HttpSource {
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        log::debug!("GET {url}");
        let body = SHARED_RUNTIME.block_on(async {
            let response = http_client()
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(&e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Remote {
                    status: status.as_u16(),
                    message: status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string(),
                });
            }

            response
                .text()
                .await
                .map_err(|e| FetchError::from_reqwest(&e))
        })?;

        parse_document(&body, url)
    }
}

/// Parse a response body and attach the requesting URL under [`URL_KEY`].
///
/// Only JSON objects are accepted; the attached URL replaces any `url` field the
/// server sent.
pub fn parse_document(body: &str, url: &str) -> Result<Value, FetchError> {
    let mut value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    match value.as_object_mut() {
        Some(obj) => {
            obj.insert(URL_KEY.to_string(), Value::String(url.to_string()));
            Ok(value)
        }
        None => Err(FetchError::Parse(format!(
            "expected a JSON object from {url}"
        ))),
    }
}
