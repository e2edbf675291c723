//! Directory management
//!
//! Resolves where rpem keeps its state and its user configuration.
//!
//! Environment variables can override default directories:
//! - `RPEM_DATA_DIR` - Override data directory (default `~/.rpem`)
//! - `RPEM_CONFIG_DIR` - Override config directory

use std::env;
use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::infra::fetch::canonical_path;

/// Environment variable names for directory overrides
pub const ENV_DATA_DIR: &str = "RPEM_DATA_DIR";
pub const ENV_CONFIG_DIR: &str = "RPEM_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "rpem";

/// Directory provider for rpem
#[derive(Debug, Clone)]
pub struct RpemDirs {
    config_dir: PathBuf,
    data_dir: PathBuf,
    data_dir_overridden: bool,
}

impl RpemDirs {
    /// Create a new `RpemDirs` instance
    ///
    /// Checks environment variables first, then falls back to defaults.
    #[must_use]
    pub fn new() -> Self {
        let data_override = env::var_os(ENV_DATA_DIR).map(PathBuf::from);
        Self {
            config_dir: Self::resolve_config_dir(),
            data_dir_overridden: data_override.is_some(),
            data_dir: data_override.unwrap_or_else(Self::default_data_dir),
        }
    }

    /// Use `data_dir` regardless of environment and config file
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self.data_dir_overridden = true;
        self
    }

    /// Get the config directory path
    ///
    /// - Linux: `$XDG_CONFIG_HOME/rpem` or `~/.config/rpem`
    /// - macOS: `~/Library/Application Support/rpem`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Get the data directory path (`~/.rpem` unless overridden)
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    /// Whether the data directory was set explicitly (env or flag)
    #[must_use]
    pub fn data_dir_overridden(&self) -> bool {
        self.data_dir_overridden
    }

    /// Get the global config file path
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }

    fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(defaults::DATA_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(".").join(defaults::DATA_DIR_NAME))
    }
}

impl Default for RpemDirs {
    fn default() -> Self {
        Self::new()
    }
}

/// Layout of a data directory
///
/// ```text
/// <root>/index.json        state document
/// <root>/images/<id>.img   materialized disk images
/// <root>/fw/<id>.fw        firmware blobs
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the state document
    pub fn state_file(&self) -> PathBuf {
        self.root.join(defaults::STATE_FILE)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(defaults::IMAGES_SUBDIR)
    }

    pub fn firmware_dir(&self) -> PathBuf {
        self.root.join(defaults::FIRMWARE_SUBDIR)
    }

    /// Canonical path of an image file
    pub fn image_path(&self, image_id: &str) -> PathBuf {
        canonical_path(&self.images_dir(), image_id, defaults::IMAGE_EXT)
    }

    /// Canonical path of a firmware file
    pub fn firmware_path(&self, firmware_id: &str) -> PathBuf {
        canonical_path(&self.firmware_dir(), firmware_id, defaults::FIRMWARE_EXT)
    }
}
