// Application settings
// Loaded from ~/.config/dexclean/settings.toml

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use dexclean_canon::CleanOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("invalid settings: {0}")]
    Validation(String),
}

/// Where reference names come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceSettings {
    /// API root, without the endpoint segment
    pub base_url: String,

    /// Per-request timeout. No retries.
    pub timeout_secs: u64,

    /// `limit` sent with the first listing request
    pub page_size: u32,

    /// Skip the network entirely; remote tables are treated as degraded
    pub offline: bool,
}

impl Default for ReferenceSettings {
    fn default() -> Self {
        Self {
            base_url: "https://pokeapi.co/api/v2".to_string(),
            timeout_secs: 10,
            page_size: 10_000,
            offline: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Dataset file, relative to the working directory unless absolute
    pub database: PathBuf,

    pub reference: ReferenceSettings,

    /// Thresholds, empty-reference policy, fixed vocabularies
    pub cleaning: CleanOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: PathBuf::from("pokemon_assessment.db"),
            reference: ReferenceSettings::default(),
            cleaning: CleanOptions::default(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dexclean")
            .join("settings.toml")
    }

    /// Load settings.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// tried and a missing file means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let path = Self::config_path();
        if !path.exists() {
            debug!(path = %path.display(), "no settings file; using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.as_os_str().is_empty() {
            return Err(ConfigError::Validation("database path is empty".into()));
        }
        if self.reference.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("reference.base_url is empty".into()));
        }
        if self.reference.timeout_secs == 0 {
            return Err(ConfigError::Validation("reference.timeout_secs must be at least 1".into()));
        }
        if self.reference.page_size == 0 {
            return Err(ConfigError::Validation("reference.page_size must be at least 1".into()));
        }
        self.cleaning
            .validate()
            .map_err(|e| ConfigError::Validation(format!("cleaning: {e}")))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.reference.timeout_secs)
    }
}
