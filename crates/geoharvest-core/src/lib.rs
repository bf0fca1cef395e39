//! Geoharvest Core - shared plumbing for catalog harvesters
//!
//! HTTP JSON fetching, the fetch error taxonomy, logging, progress display
//! and interrupt handling.

pub mod error;
pub mod fetch;
pub mod logging;
pub mod progress;
pub mod shutdown;

// Re-exports for convenience
pub use error::FetchError;
pub use fetch::{
    HttpConfig, HttpSource, JsonSource, SHARED_RUNTIME, URL_KEY, http_client, http_config,
    parse_document, set_http_config,
};
pub use logging::init_logging;
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use shutdown::{install_signal_handlers, shutdown_flag};
