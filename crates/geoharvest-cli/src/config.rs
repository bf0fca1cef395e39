//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration for geoharvest
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub http: HttpSection,
    pub geogratis: GeogratisSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for HttpSection {
    fn default() -> Self {
        let defaults = geoharvest_core::HttpConfig::default();
        Self {
            timeout_secs: defaults.timeout.as_secs(),
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            user_agent: None,
        }
    }
}

impl HttpSection {
    pub fn to_http_config(&self) -> geoharvest_core::HttpConfig {
        let defaults = geoharvest_core::HttpConfig::default();
        geoharvest_core::HttpConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeogratisSection {
    pub base_url: String,
    pub item_delay_ms: u64,
    pub state_file: PathBuf,
    pub excluded_product_types: Vec<String>,
    /// Replacement lookup tables (TOML)
    pub lookups: Option<PathBuf>,
}

impl Default for GeogratisSection {
    fn default() -> Self {
        let defaults = geoharvest_geogratis::Config::default();
        Self {
            base_url: defaults.base_url,
            item_delay_ms: defaults.item_delay.as_millis() as u64,
            state_file: defaults.state_file,
            excluded_product_types: defaults.excluded_product_types,
            lookups: None,
        }
    }
}

impl GeogratisSection {
    /// Harvester config before command-line overrides
    pub fn to_harvest_config(&self) -> geoharvest_geogratis::Config {
        geoharvest_geogratis::Config {
            base_url: self.base_url.clone(),
            item_delay: Duration::from_millis(self.item_delay_ms),
            state_file: self.state_file.clone(),
            excluded_product_types: self.excluded_product_types.clone(),
            lookups: self.lookups.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Force pretty (`true`) or compact (`false`) records; unset picks by target
    pub pretty: Option<bool>,
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./geoharvest.toml (current directory)
    /// 2. ~/.config/geoharvest/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("geoharvest.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "geoharvest") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
