//! Persisted feed cursor for resumable walks
//!
//! Stored as a small TOML file:
//!
//! ```toml
//! [geogratis]
//! next_link = "http://geogratis.gc.ca/api/en/nrcan-rncan/ess-sst?..."
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    geogratis: CursorSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CursorSection {
    /// Next unread feed page; empty means start of feed
    #[serde(default)]
    next_link: String,
}

/// File-backed cursor store
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved cursor, or `None` if the file is missing or the cursor is empty.
    ///
    /// An unreadable or malformed file is an error.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read cursor file {}", self.path.display()))?;
        let state: StateFile = toml::from_str(&content)
            .with_context(|| format!("Malformed cursor file {}", self.path.display()))?;
        let link = state.geogratis.next_link.trim().to_string();
        Ok((!link.is_empty()).then_some(link))
    }

    /// Persist `link` as the next page to read.
    ///
    /// Written to a temp file and renamed so a crash never leaves a torn cursor.
    pub fn save(&self, link: &str) -> Result<()> {
        let state = StateFile {
            geogratis: CursorSection {
                next_link: link.to_string(),
            },
        };
        let content = toml::to_string(&state).context("Failed to serialize cursor")?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, content)
            .with_context(|| format!("Cannot write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Cannot replace {}", self.path.display()))?;
        log::debug!("Cursor saved: {link:?}");
        Ok(())
    }

    /// Reset to the start of the feed
    pub fn clear(&self) -> Result<()> {
        self.save("")
    }
}
