//! The update cycle.
//!
//! ```text
//! START ──► RECOVER_STAGED ──────────────────────────────────► APPLYING ──► DONE
//!   │            │ (staged file rejected)                         ▲
//!   └────────────┴──► CHECK_REMOTE ──► CHECK_LOCAL ──► DOWNLOADING ┘
//!                          │               │
//!                        ERROR          UP_TO_DATE
//! ```
//!
//! A staged artifact left by an earlier run always takes priority over the
//! remote check, so a cycle interrupted between download and promotion is
//! finished by the next one without touching the network.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::constants::STAGED_SUFFIX;
use crate::core::UpdaterError;
use crate::source::ReleaseSource;
use crate::upgrade::backup::{ArchiveEntry, BackupManager};
use crate::upgrade::config::UpdaterConfig;
use crate::upgrade::scanner::{self, display_name};
use crate::upgrade::verification::StagingManifest;
use crate::version::VersionTag;

/// Result of [`Updater::update_cycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A staged artifact was promoted.
    Updated {
        /// The new current artifact.
        artifact: PathBuf,
        /// The artifact that was current before promotion, if any.
        previous: Option<PathBuf>,
        /// Where `previous` was archived to.
        archived_to: Option<PathBuf>,
    },
    /// The current artifact already matches the latest remote build.
    UpToDate {
        /// The current artifact.
        artifact: PathBuf,
    },
}

/// Result of [`Updater::restore_cycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The newest archive was restored to this path.
    Restored(PathBuf),
    /// No archives exist; nothing was changed.
    NothingToRestore,
}

/// Local and remote state as seen by [`Updater::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    /// The current artifact, if any.
    pub current: Option<PathBuf>,
    /// Version parsed from the current artifact's name.
    pub local: Option<VersionTag>,
    /// Latest remote build.
    pub remote: VersionTag,
    /// Whether an update cycle would download `remote`.
    pub update_available: bool,
}

/// Keeps one install directory in sync with a [`ReleaseSource`].
///
/// Every step is a sequential `await`; mutations are single renames inside the
/// install directory. Running two updaters against the same directory at the
/// same time is not supported.
pub struct Updater<S> {
    install_dir: PathBuf,
    config: UpdaterConfig,
    source: S,
    backups: BackupManager,
}

impl<S: ReleaseSource> Updater<S> {
    /// Create an updater for `install_dir`.
    pub fn new(install_dir: impl Into<PathBuf>, config: UpdaterConfig, source: S) -> Self {
        let install_dir = install_dir.into();
        let backups = BackupManager::new(install_dir.clone(), config.extension());
        Self {
            install_dir,
            config,
            source,
            backups,
        }
    }

    /// Install directory this updater manages.
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Run one update cycle.
    ///
    /// # Errors
    ///
    /// - [`UpdaterError::DirectoryNotFound`] before anything else is attempted
    /// - [`UpdaterError::Discovery`] / [`UpdaterError::Transfer`] from the source;
    ///   the current artifact is untouched
    /// - [`UpdaterError::AmbiguousCurrentArtifact`] when the directory holds more
    ///   than one current artifact
    /// - [`UpdaterError::SizeMismatch`] / [`UpdaterError::ChecksumMismatch`] when a
    ///   fresh download does not match its published metadata; the staged file
    ///   is removed
    /// - [`UpdaterError::FileSystemError`] when archiving or promotion is rejected
    pub async fn update_cycle(&self) -> Result<UpdateOutcome> {
        self.ensure_install_dir().await?;

        if let Some(staged) = self.recover_staged().await? {
            return self.apply(&staged).await;
        }

        let remote = self.source.latest_build().await?;
        let current = scanner::find_current(&self.install_dir, self.config.extension())?;
        let local = current.as_deref().and_then(VersionTag::from_path);

        match (current, &local) {
            (Some(artifact), Some(local)) if *local == remote => {
                info!("{} is up to date ({})", display_name(&artifact), local);
                return Ok(UpdateOutcome::UpToDate {
                    artifact,
                });
            }
            (Some(artifact), Some(local)) => {
                info!("Update available: {} -> {} ({})", local, remote, display_name(&artifact));
            }
            (Some(artifact), None) => {
                info!(
                    "Cannot read a version from {}; installing {}",
                    display_name(&artifact),
                    remote
                );
            }
            (None, _) => info!("No server artifact installed; installing {}", remote),
        }

        let staged = self.download(&remote).await?;
        self.apply(&staged).await
    }

    /// Restore the most recently archived artifact.
    pub async fn restore_cycle(&self) -> Result<RestoreOutcome> {
        self.ensure_install_dir().await?;

        match self.backups.restore().await? {
            Some(restored) => Ok(RestoreOutcome::Restored(restored)),
            None => {
                info!("No archived artifacts in {}", self.install_dir.display());
                Ok(RestoreOutcome::NothingToRestore)
            }
        }
    }

    /// Compare local and remote versions without changing anything.
    pub async fn check(&self) -> Result<UpdateCheck> {
        self.ensure_install_dir().await?;

        let remote = self.source.latest_build().await?;
        let current = scanner::find_current(&self.install_dir, self.config.extension())?;
        let local = current.as_deref().and_then(VersionTag::from_path);
        let update_available = local.as_ref() != Some(&remote);

        Ok(UpdateCheck {
            current,
            local,
            remote,
            update_available,
        })
    }

    /// Archived artifacts, newest first.
    pub async fn list_backups(&self) -> Result<Vec<ArchiveEntry>> {
        self.ensure_install_dir().await?;
        self.backups.list().await
    }

    /// Promote `staged` to current.
    ///
    /// The current artifact, if any, is archived first. The staged name minus
    /// its `.new` suffix becomes the new artifact name.
    pub async fn apply(&self, staged: &Path) -> Result<UpdateOutcome> {
        let target = promotion_target(staged)?;
        let previous = scanner::find_current(&self.install_dir, self.config.extension())?;

        let archived_to = match &previous {
            Some(current) if current != staged => Some(self.backups.archive(current).await?),
            _ => None,
        };

        fs::rename(staged, &target).await.map_err(|e| {
            anyhow::Error::new(e).context(UpdaterError::FileSystemError {
                operation: format!("promote {} to {}", display_name(staged), display_name(&target)),
                path: staged.display().to_string(),
            })
        })?;
        StagingManifest::remove(staged).await?;

        info!("Installed {}", display_name(&target));
        Ok(UpdateOutcome::Updated {
            artifact: target,
            previous,
            archived_to,
        })
    }

    async fn ensure_install_dir(&self) -> Result<()> {
        if fs::metadata(&self.install_dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Ok(());
        }
        Err(UpdaterError::DirectoryNotFound {
            path: self.install_dir.display().to_string(),
        }
        .into())
    }

    /// The staged artifact to promote, if there is a trustworthy one.
    ///
    /// Only the most recent staged file is considered. One that fails
    /// verification is removed together with its manifest and `None` is
    /// returned so the cycle falls through to a fresh download.
    async fn recover_staged(&self) -> Result<Option<PathBuf>> {
        let staged = scanner::find_staged(&self.install_dir, self.config.extension())?;
        let Some(latest) = staged.first().cloned() else {
            return Ok(None);
        };
        if staged.len() > 1 {
            debug!(
                "{} staged artifacts found; only {} is considered",
                staged.len(),
                display_name(&latest)
            );
        }
        info!("Found staged artifact {}", display_name(&latest));

        if !self.config.verify_checksum {
            return Ok(Some(latest));
        }

        let verdict = match StagingManifest::load(&latest).await {
            Ok(Some(manifest)) => manifest.verify(&latest).await,
            Ok(None) => {
                warn!(
                    "No staging manifest for {}; promoting it without verification",
                    display_name(&latest)
                );
                return Ok(Some(latest));
            }
            Err(e) => Err(e),
        };

        match verdict {
            Ok(()) => Ok(Some(latest)),
            Err(e) => {
                warn!("Discarding staged artifact {}: {:#}", display_name(&latest), e);
                self.discard(&latest).await?;
                Ok(None)
            }
        }
    }

    /// Stage the artifact for `remote`, returning the staged path.
    async fn download(&self, remote: &VersionTag) -> Result<PathBuf> {
        let info = self.source.resolve_download(remote).await?;
        let bare_name = Path::new(&info.file_name).file_name().and_then(|n| n.to_str());
        if bare_name != Some(info.file_name.as_str()) {
            return Err(UpdaterError::Discovery {
                operation: format!("resolve download for {remote}"),
                reason: format!("refusing artifact name '{}'", info.file_name),
            }
            .into());
        }

        let staged = self.install_dir.join(format!("{}{STAGED_SUFFIX}", info.file_name));
        let manifest = StagingManifest::from_download(&info);
        if self.config.verify_checksum {
            manifest.save(&staged).await?;
        }

        let written = match self.source.download(&info, &staged).await {
            Ok(written) => written,
            Err(e) => {
                // A partial file keeps its manifest so the next cycle can reject it
                if !fs::try_exists(&staged).await.unwrap_or(false) {
                    StagingManifest::remove(&staged).await?;
                }
                return Err(e);
            }
        };
        debug!("Staged {} ({} bytes)", display_name(&staged), written);

        if self.config.verify_checksum {
            if let Err(e) = manifest.verify(&staged).await {
                self.discard(&staged).await?;
                return Err(e);
            }
        }

        Ok(staged)
    }

    async fn discard(&self, staged: &Path) -> Result<()> {
        match fs::remove_file(staged).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {}", staged.display()));
            }
        }
        StagingManifest::remove(staged).await
    }
}

/// Name a staged artifact is promoted to: the staged name minus `.new`.
fn promotion_target(staged: &Path) -> Result<PathBuf> {
    let name = display_name(staged);
    let stem = name
        .strip_suffix(STAGED_SUFFIX)
        .filter(|stem| !stem.is_empty())
        .with_context(|| format!("Not a staged artifact: {}", staged.display()))?;
    Ok(staged.with_file_name(stem))
}
