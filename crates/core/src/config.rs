use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// Settings read from an optional TOML file. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Location of the SQLite catalog.
    pub catalog_path: PathBuf,
    /// Joins album titles in full paths.
    pub path_separator: String,
    /// Re-check the whole tree before committing each mutation.
    pub verify_mutations: bool,
    /// How long a writer waits for the database lock.
    pub busy_timeout_ms: u64,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            path_separator: "/".to_string(),
            verify_mutations: true,
            busy_timeout_ms: 5000,
            log_filter: "warn".to_string(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

pub fn default_catalog_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".albumtree").join("catalog.db")
}
