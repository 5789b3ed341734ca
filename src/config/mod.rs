//! Configuration management for paperup
//!
//! paperup reads a single optional TOML file. Settings resolve in this order,
//! first match wins:
//!
//! 1. Command-line flags (`--dir`, `--no-progress`, ...)
//! 2. Environment variables (`PAPER_DIR`, `PAPERUP_NO_PROGRESS`)
//! 3. The config file (`--config`, `PAPERUP_CONFIG_PATH`, `~/.paperup/config.toml`)
//! 4. Built-in defaults
//!
//! # Modules
//!
//! - `global` - loading and path resolution for the config file
//!
//! The `[updater]` table deserializes into
//! [`UpdaterConfig`](crate::upgrade::UpdaterConfig), which is handed to the
//! updater and the release source explicitly.

pub mod global;

pub use global::GlobalConfig;
