//! Settings file handling.

use std::path::{Path, PathBuf};

use mailsort_core::RawWeights;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Persisted application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Raw scoring weights; resolved into a `WeightConfig` per run.
    pub weights: RawWeights,
    /// Directory holding the Maildir folders.
    #[serde(alias = "maildirRoot", skip_serializing_if = "Option::is_none")]
    pub maildir_root: Option<PathBuf>,
    /// Database location, when not the default.
    #[serde(alias = "databasePath", skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

impl Settings {
    /// Default settings file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mailsort")
            .join("settings.json")
    }

    /// Load settings from `path`.
    ///
    /// A missing file yields the defaults. An unreadable or malformed file is
    /// logged and also yields the defaults.
    pub async fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Self::default();
        }

        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), "Failed to read settings: {e}");
                return Self::default();
            }
        };

        Self::from_json(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), "Invalid settings file, using defaults: {e}");
            Self::default()
        })
    }

    /// Parse settings from JSON text.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str(contents)
    }
}

/// Default database location.
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailsort")
        .join("mailsort.db")
}
