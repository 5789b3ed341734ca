//! paperup - keep a PaperMC server jar on the latest build
//!
//! paperup watches one server directory. Each run asks the PaperMC Fill API
//! for the newest build, downloads it next to the running jar as `*.new`,
//! archives the old jar as `*.old` and renames the new one into place. Every
//! superseded jar is kept and the newest archive can be restored at any time.
//!
//! # Architecture Overview
//!
//! The on-disk state is the only state. A file's role is encoded in its name:
//!
//! ```text
//! paper-1.21.4-231.jar            current
//! paper-1.21.4-232.jar.new        staged, awaiting promotion
//! paper-1.21.4-232.jar.new.json   expected size and SHA-256 of the staged file
//! paper-1.21.4-230.jar.old        archived
//! paper-1.21.4-229.jar.old.1      archived (name collision)
//! ```
//!
//! A run interrupted at any point leaves a directory the next run can finish:
//! a staged file is verified and promoted before the network is consulted.
//!
//! # Core Modules
//!
//! - [`upgrade`] - scanning, archiving, staging verification and the update cycle
//! - [`source`] - the release source trait and the Fill v3 client
//! - [`version`] - version and build parsing from artifact file names
//! - [`config`] - the optional `~/.paperup/config.toml`
//! - [`core`] - error types and user-facing error reporting
//! - [`cli`] - command-line parsing and output
//! - [`utils`] - progress indicators
//!
//! # Example
//!
//! ```rust,no_run
//! use paperup_cli::source::FillClient;
//! use paperup_cli::upgrade::{UpdateOutcome, Updater, UpdaterConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = UpdaterConfig::default();
//! let source = FillClient::new(&config)?;
//! let updater = Updater::new("/srv/paper", config, source);
//!
//! match updater.update_cycle().await? {
//!     UpdateOutcome::Updated { artifact, .. } => println!("Installed {}", artifact.display()),
//!     UpdateOutcome::UpToDate { .. } => println!("Already up to date"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod source;
pub mod upgrade;
pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
