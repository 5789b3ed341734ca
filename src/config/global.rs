//! User-wide paperup configuration.
//!
//! # Location
//!
//! - **Unix/macOS**: `~/.paperup/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\paperup\config.toml`
//! - **Override**: `--config <path>` or the `PAPERUP_CONFIG_PATH` environment variable
//!
//! # File Format
//!
//! ```toml
//! # Default install directory when neither --dir nor PAPER_DIR is given
//! install_dir = "~/servers/survival"
//!
//! [updater]
//! project = "paper"
//! verify_checksum = true
//! timeout_secs = 300
//! user_agent = "paperup/0.1.0 (admin@example.com)"
//! ```
//!
//! Every key is optional; a missing file behaves like an empty one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::constants::ENV_CONFIG_PATH;
use crate::core::UpdaterError;
use crate::upgrade::UpdaterConfig;

/// Contents of the paperup configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GlobalConfig {
    /// Default install directory.
    ///
    /// Supports `~` and `$VAR` expansion. Used only when neither `--dir` nor
    /// `PAPER_DIR` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<String>,

    /// Update behaviour.
    #[serde(default)]
    pub updater: UpdaterConfig,
}

impl GlobalConfig {
    /// Load configuration, choosing the file in priority order.
    ///
    /// 1. `path`, when given; it must exist
    /// 2. `PAPERUP_CONFIG_PATH`, when set
    /// 3. [`GlobalConfig::default_path`]
    ///
    /// For 2 and 3 a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::ConfigError`] when an explicit path does not exist or a
    /// file cannot be parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(UpdaterError::ConfigError {
                    message: format!("config file {} does not exist", path.display()),
                }
                .into());
            }
            return Self::load_from(&path).await;
        }

        let path = match std::env::var_os(ENV_CONFIG_PATH) {
            Some(path) => PathBuf::from(path),
            None => Self::default_path()?,
        };

        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No config file at {}; using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config = toml::from_str(&content).map_err(|e| UpdaterError::ConfigError {
            message: format!("{}: {}", path.display(), e.to_string().trim()),
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Platform default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("paperup")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".paperup")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// `install_dir` with `~` and environment variables expanded.
    pub fn install_dir(&self) -> Result<Option<PathBuf>> {
        let Some(raw) = &self.install_dir else {
            return Ok(None);
        };

        let expanded = shellexpand::full(raw).map_err(|e| UpdaterError::ConfigError {
            message: format!("cannot expand install_dir '{raw}': {e}"),
        })?;
        Ok(Some(PathBuf::from(expanded.as_ref())))
    }
}
