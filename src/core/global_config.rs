//! Global configuration management
//!
//! Reads user settings from `config.toml` in the config directory: where the
//! data directory lives, an optional replacement catalog, the emulator
//! binary prefix and network timeouts.

use crate::config::defaults;
use crate::core::catalog::Catalog;
use crate::error::CatalogError;
use crate::infra::dirs::RpemDirs;
use crate::infra::download::DownloadManager;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Global configuration error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Global configuration for rpem
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub emulator: EmulatorConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Filesystem locations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Data directory (state document, images, firmware)
    pub data_dir: Option<PathBuf>,
}

/// Default catalog source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON catalog used instead of the built-in one
    pub path: Option<PathBuf>,
}

/// Emulator settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// Replaces `qemu-system-` in front of the hardware architecture
    pub prefix: Option<String>,
}

/// Download settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Whole-transfer timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Connection timeout in seconds
    pub connect_timeout_secs: Option<u64>,
}

impl GlobalConfig {
    /// Load global configuration from the config directory
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `GlobalConfigError::ParseError` if the config file exists but
    /// contains invalid TOML.
    pub fn load(dirs: &RpemDirs) -> Result<Self, GlobalConfigError> {
        Self::load_from_path(&dirs.global_config_path())
    }

    /// Load global configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Effective data directory
    ///
    /// `RPEM_DATA_DIR` wins over the config file, which wins over `~/.rpem`.
    #[must_use]
    pub fn data_dir(&self, dirs: &RpemDirs) -> PathBuf {
        if dirs.data_dir_overridden() {
            return dirs.data_dir();
        }
        self.paths.data_dir.clone().unwrap_or_else(|| dirs.data_dir())
    }

    /// Catalog to seed and update defaults from
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog.path {
            Some(path) => {
                tracing::debug!("Using catalog {}", path.display());
                Catalog::load_from_path(path)
            }
            None => Catalog::builtin(),
        }
    }

    #[must_use]
    pub fn emulator_prefix(&self) -> Option<String> {
        self.emulator.prefix.clone()
    }

    /// Download manager with the configured timeouts
    #[must_use]
    pub fn download_manager(&self) -> DownloadManager {
        DownloadManager::with_timeouts(
            Duration::from_secs(
                self.network
                    .timeout_secs
                    .unwrap_or(defaults::DOWNLOAD_TIMEOUT_SECS),
            ),
            Duration::from_secs(
                self.network
                    .connect_timeout_secs
                    .unwrap_or(defaults::CONNECT_TIMEOUT_SECS),
            ),
        )
    }
}
