//! Command-line interface for paperup.
//!
//! paperup has no subcommands. Without a mode flag it runs one update cycle;
//! `--check`, `--restore` and `--list-backups` select the other modes.
//!
//! # Usage
//!
//! ```bash
//! # Update the jar in the current directory (or $PAPER_DIR)
//! paperup
//!
//! # Update a specific install, quietly, from cron
//! paperup --dir /srv/paper --quiet --no-progress
//!
//! # Report local and remote versions
//! paperup --check
//!
//! # Roll back to the most recent archive
//! paperup --restore
//! ```
//!
//! # Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success, already up to date, or a remote failure (no update performed) |
//! | 1 | Any other failure (restore, filesystem, integrity, configuration) |
//! | 2 | The install directory does not exist |
//!
//! A remote failure leaves the directory untouched and exits 0; the next run
//! retries.


use anyhow::Result;
use chrono::{DateTime, Local};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::GlobalConfig;
use crate::constants::ENV_INSTALL_DIR;
use crate::core::{UpdaterError, find_updater_error};
use crate::source::FillClient;
use crate::upgrade::{ArchiveEntry, RestoreOutcome, UpdateCheck, UpdateOutcome, Updater};
use crate::upgrade::scanner::display_name;

/// Runtime configuration derived from the command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Default log directive for `tracing` (`debug`, `info` or `warn`).
    ///
    /// `RUST_LOG`, when set, takes precedence.
    pub log_level: String,

    /// Whether progress bars and spinners are disabled.
    pub no_progress: bool,

    /// Explicit configuration file path.
    pub config_path: Option<PathBuf>,
}

/// What a paperup invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Run one update cycle.
    Update,
    /// Report local and remote versions without changing anything.
    Check,
    /// Restore the most recent archive.
    Restore,
    /// List archived artifacts.
    ListBackups,
}

/// Keep a PaperMC server jar on the latest build.
#[derive(Parser, Debug)]
#[command(
    name = "paperup",
    about = "Keep a PaperMC server jar on the latest build",
    version,
    long_about = "paperup downloads the latest PaperMC build into a server directory, \
                  archives the jar it replaces, and can roll back to the most recent archive."
)]
pub struct Cli {
    /// Server directory containing the jar.
    ///
    /// Falls back to `install_dir` from the config file, then to the current
    /// directory.
    #[arg(short, long, env = ENV_INSTALL_DIR, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print warnings and errors.
    #[arg(short, long)]
    quiet: bool,

    /// Restore the most recent archived jar and exit.
    #[arg(short, long, conflicts_with_all = ["check", "list_backups"])]
    restore: bool,

    /// Report the installed and latest versions without changing anything.
    #[arg(long, conflicts_with = "list_backups")]
    check: bool,

    /// List archived jars, newest first, and exit.
    #[arg(long)]
    list_backups: bool,

    /// Path to the config file (default: $PAPERUP_CONFIG_PATH, then ~/.paperup/config.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable progress bars and spinners.
    #[arg(long)]
    no_progress: bool,
}

impl Cli {
    /// Selected mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        if self.restore {
            Mode::Restore
        } else if self.check {
            Mode::Check
        } else if self.list_backups {
            Mode::ListBackups
        } else {
            Mode::Update
        }
    }

    /// Build a [`CliConfig`] from the parsed flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        };

        CliConfig {
            log_level: log_level.to_string(),
            no_progress: self.no_progress,
            config_path: self.config.clone(),
        }
    }

    /// Run the selected mode.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        let global = GlobalConfig::load_with_optional(config.config_path.clone()).await?;
        let install_dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => global.install_dir()?.unwrap_or_else(|| PathBuf::from(".")),
        };

        let source = FillClient::new(&global.updater)?.with_progress(!config.no_progress);
        let updater = Updater::new(install_dir, global.updater, source);

        match self.mode() {
            Mode::Update => {
                let outcome = updater.update_cycle().await?;
                if !self.quiet {
                    print_update(&outcome);
                }
            }
            Mode::Restore => {
                let outcome = updater.restore_cycle().await?;
                if !self.quiet {
                    print_restore(&outcome);
                }
            }
            Mode::Check => print_check(&updater.check().await?),
            Mode::ListBackups => print_backups(&updater.list_backups().await?),
        }

        Ok(())
    }
}

/// Process exit code for a failed invocation.
///
/// `2` for a missing install directory, `0` for retryable remote failures
/// (nothing was changed), `1` for everything else.
pub fn exit_code_for(error: &anyhow::Error) -> u8 {
    match find_updater_error(error) {
        Some(UpdaterError::DirectoryNotFound { .. }) => 2,
        Some(e) if e.is_retryable() => 0,
        _ => 1,
    }
}

fn print_update(outcome: &UpdateOutcome) {
    match outcome {
        UpdateOutcome::Updated {
            artifact,
            previous,
            archived_to,
        } => {
            println!("{} Installed {}", "✓".green(), display_name(artifact).bold());
            if let (Some(previous), Some(archived_to)) = (previous, archived_to) {
                println!(
                    "  {} archived as {}",
                    display_name(previous),
                    display_name(archived_to).dimmed()
                );
            }
        }
        UpdateOutcome::UpToDate {
            artifact,
        } => {
            println!("{} {} is up to date", "✓".green(), display_name(artifact).bold());
        }
    }
}

fn print_restore(outcome: &RestoreOutcome) {
    match outcome {
        RestoreOutcome::Restored(path) => {
            println!("{} Restored {}", "✓".green(), display_name(path).bold());
        }
        RestoreOutcome::NothingToRestore => {
            println!("{} No archived jars to restore", "!".yellow());
        }
    }
}

fn print_check(check: &UpdateCheck) {
    let installed = match (&check.current, &check.local) {
        (_, Some(local)) => local.to_string(),
        (Some(current), None) => format!("{} (unversioned)", display_name(current)),
        (None, None) => "none".to_string(),
    };
    println!("Installed: {installed}");
    println!("Latest:    {}", check.remote);

    if check.update_available {
        println!("{} Update available", "→".cyan());
    } else {
        println!("{} Up to date", "✓".green());
    }
}

fn print_backups(entries: &[ArchiveEntry]) {
    if entries.is_empty() {
        println!("No archived jars");
        return;
    }

    for entry in entries {
        let modified: DateTime<Local> = entry.modified.into();
        let version = entry
            .version
            .as_ref()
            .map_or_else(|| "unknown".to_string(), ToString::to_string);
        println!(
            "{}  {:<16} {}",
            modified.format("%Y-%m-%d %H:%M:%S"),
            version,
            display_name(&entry.path)
        );
    }
}
