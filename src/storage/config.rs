//! Configuration handling for keystash
//!
//! Configuration is stored as TOML, either at an explicit path or at
//! `~/.config/keystash/config.toml` (global):
//!
//! ```toml
//! [store]
//! path = "/var/lib/app/state.json"
//! create_missing_directories = true
//! pretty = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Settings for a file-backed store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the store document
    pub path: Option<PathBuf>,

    /// Create missing parent directories on first write (default true)
    pub create_missing_directories: bool,

    /// Write the document indented
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            create_missing_directories: true,
            pretty: false,
        }
    }
}

/// Loaded configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,

    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from `explicit`, or from the global location.
    ///
    /// An explicit file must exist. A missing global file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let config_path = match Self::global_config_dir() {
            Some(dir) => dir.join("config.toml"),
            None => return Ok(Self::default()),
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::from_file(&config_path)
    }

    /// Reads configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let mut config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parses configuration from TOML text
    pub fn parse(content: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "keystash", "keystash").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the store path used when neither flag nor config names one
    pub fn default_store_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "keystash", "keystash")
            .map(|dirs| dirs.data_dir().join("store.json"))
    }

    /// Resolves the store path: override, then config, then the default
    pub fn resolve_store_path(&self, override_path: Option<&Path>) -> Result<PathBuf> {
        override_path
            .map(Path::to_path_buf)
            .or_else(|| self.store.path.clone())
            .or_else(Self::default_store_path)
            .ok_or_else(|| {
                ConfigError::Invalid(
                    "no store path given and no data directory available".to_string(),
                )
                .into()
            })
    }

    /// Saves the configuration as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }
}
