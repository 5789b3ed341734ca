use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::constants::ARCHIVED_MARKER;
use crate::core::UpdaterError;
use crate::upgrade::scanner::{self, display_name};
use crate::version::VersionTag;

/// Archives superseded server artifacts and restores them on request.
///
/// `BackupManager` never copies and never deletes: every operation is a single
/// `rename` inside the install directory, so the directory always shows either
/// the state before or after a step, never a half-written file.
///
/// # Backup Strategy
///
/// An artifact is archived by appending `.old` to its name. When that name is
/// taken, `.old.1`, `.old.2`, ... are tried in order until a free name is
/// found, so an existing archive is never overwritten:
///
/// ```text
/// paper-1.20.1-123.jar  →  paper-1.20.1-123.jar.old
/// paper-1.20.1-123.jar  →  paper-1.20.1-123.jar.old.1   (second time)
/// ```
///
/// Archives are never purged automatically.
///
/// # Examples
///
/// ```rust,no_run
/// use paperup_cli::upgrade::backup::BackupManager;
/// use std::path::PathBuf;
///
/// # async fn example() -> anyhow::Result<()> {
/// let manager = BackupManager::new(PathBuf::from("/srv/paper"), "jar");
///
/// // Move the running jar out of the way
/// let archived = manager.archive(&PathBuf::from("/srv/paper/paper-1.20.1-123.jar")).await?;
/// println!("Archived to {}", archived.display());
///
/// // Roll back to the most recent archive
/// if let Some(restored) = manager.restore().await? {
///     println!("Restored {}", restored.display());
/// }
/// # Ok(())
/// # }
/// ```
pub struct BackupManager {
    /// Install directory holding the artifacts.
    dir: PathBuf,
    /// Artifact extension without the leading dot.
    extension: String,
}

/// An archived artifact as reported by [`BackupManager::list`].
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Full path of the archive file.
    pub path: PathBuf,
    /// Last modification time, used to pick the restore candidate.
    pub modified: SystemTime,
    /// Version parsed from the name the archive restores to.
    pub version: Option<VersionTag>,
}

impl BackupManager {
    /// Create a manager for the artifacts with `extension` in `dir`.
    pub fn new(dir: PathBuf, extension: impl Into<String>) -> Self {
        Self {
            dir,
            extension: extension.into(),
        }
    }

    /// First free archive name for `path`.
    ///
    /// Tries `<name>.old`, then `<name>.old.1`, `<name>.old.2`, ... and
    /// returns the first that does not exist.
    pub async fn archive_slot(path: &Path) -> Result<PathBuf> {
        let name = path
            .file_name()
            .with_context(|| format!("Cannot archive path without a file name: {}", path.display()))?
            .to_string_lossy()
            .into_owned();

        let base = format!("{name}{ARCHIVED_MARKER}");
        let mut target = path.with_file_name(&base);
        let mut index = 1u32;
        while fs::try_exists(&target)
            .await
            .with_context(|| format!("Failed to check {}", target.display()))?
        {
            target = path.with_file_name(format!("{base}.{index}"));
            index += 1;
        }

        Ok(target)
    }

    /// Archive `path` into the first free `.old` slot.
    ///
    /// # Returns
    ///
    /// The path the artifact was moved to.
    ///
    /// # Errors
    ///
    /// - `path` does not exist
    /// - the rename is rejected (permissions, cross-device, missing directory),
    ///   reported as [`UpdaterError::FileSystemError`] with the OS error as cause
    pub async fn archive(&self, path: &Path) -> Result<PathBuf> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            bail!("Artifact to archive does not exist: {}", path.display());
        }

        let target = Self::archive_slot(path).await?;
        debug!("Archive slot for {} is {}", display_name(path), display_name(&target));

        fs::rename(path, &target)
            .await
            .map_err(|e| {
                anyhow::Error::new(e).context(UpdaterError::FileSystemError {
                    operation: format!("archive {} as {}", display_name(path), display_name(&target)),
                    path: path.display().to_string(),
                })
            })?;

        info!("Archived {} -> {}", display_name(path), display_name(&target));
        Ok(target)
    }

    /// Restore the most recently modified archive as the current artifact.
    ///
    /// The restore target is the archive name truncated at the first `.old`
    /// (`paper-1.20.1-123.jar.old.2` → `paper-1.20.1-123.jar`). An existing
    /// current artifact is archived first so it is never overwritten.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(path))` - the restored artifact
    /// - `Ok(None)` - no archives exist; nothing was changed
    ///
    /// # Crash Behaviour
    ///
    /// Archiving the current artifact and renaming the backup into place are
    /// two renames. Interrupted in between, the directory has no current
    /// artifact and one extra archive. Renames keep the mtime, so running
    /// restore again brings back whichever archive was modified last, which
    /// is not necessarily the one just created.
    pub async fn restore(&self) -> Result<Option<PathBuf>> {
        let archives = scanner::find_archived(&self.dir, &self.extension)?;
        let Some(latest) = scanner::latest_modified(&archives)? else {
            debug!("No archives found in {}", self.dir.display());
            return Ok(None);
        };

        let target = restore_target(&latest)?;
        info!("Restoring {} as {}", display_name(&latest), display_name(&target));

        if let Some(current) = scanner::find_current(&self.dir, &self.extension)? {
            warn!("Archiving current artifact {} before restore", display_name(&current));
            self.archive(&current).await?;
        }

        fs::rename(&latest, &target)
            .await
            .map_err(|e| {
                anyhow::Error::new(e).context(UpdaterError::FileSystemError {
                    operation: format!("restore {} as {}", display_name(&latest), display_name(&target)),
                    path: latest.display().to_string(),
                })
            })?;

        info!("Restored {}", display_name(&target));
        Ok(Some(target))
    }

    /// List archived artifacts, newest first.
    pub async fn list(&self) -> Result<Vec<ArchiveEntry>> {
        let mut entries = Vec::new();
        for path in scanner::find_archived(&self.dir, &self.extension)? {
            let modified = scanner::modified_time(&path)?;
            let version = restore_target(&path).ok().and_then(|t| VersionTag::from_path(&t));
            entries.push(ArchiveEntry {
                path,
                modified,
                version,
            });
        }
        entries.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(entries)
    }
}

/// Name an archive restores to: everything before the first `.old`.
pub fn restore_target(archive: &Path) -> Result<PathBuf> {
    let name = display_name(archive);
    let Some(pos) = name.find(ARCHIVED_MARKER) else {
        bail!("Not an archived artifact: {}", archive.display());
    };
    Ok(archive.with_file_name(&name[..pos]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::InstallDir;
    use std::time::Duration;

    #[tokio::test]
    async fn test_archive_first_slot() {
        let dir = InstallDir::new().unwrap();
        let jar = dir.create("paper-1.20.1-123.jar", b"v123").unwrap();
        let manager = BackupManager::new(dir.path().to_path_buf(), "jar");

        let archived = manager.archive(&jar).await.unwrap();

        assert_eq!(archived, dir.path().join("paper-1.20.1-123.jar.old"));
        assert!(!jar.exists());
        assert_eq!(dir.read("paper-1.20.1-123.jar.old").unwrap(), b"v123");
    }

    #[tokio::test]
    async fn test_archive_increments_suffix() {
        let dir = InstallDir::new().unwrap();
        let manager = BackupManager::new(dir.path().to_path_buf(), "jar");

        let mut slots = Vec::new();
        for round in 0..4u8 {
            let jar = dir.create("paper-1.20.1-123.jar", &[round]).unwrap();
            slots.push(display_name(&manager.archive(&jar).await.unwrap()));
        }

        assert_eq!(
            slots,
            vec![
                "paper-1.20.1-123.jar.old",
                "paper-1.20.1-123.jar.old.1",
                "paper-1.20.1-123.jar.old.2",
                "paper-1.20.1-123.jar.old.3",
            ]
        );
        // Every earlier archive still holds its original bytes
        assert_eq!(dir.read("paper-1.20.1-123.jar.old").unwrap(), vec![0]);
        assert_eq!(dir.read("paper-1.20.1-123.jar.old.3").unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_archive_skips_gaps_without_overwriting() {
        let dir = InstallDir::new().unwrap();
        dir.create("paper-1.20.1-123.jar.old", b"a").unwrap();
        dir.create("paper-1.20.1-123.jar.old.1", b"b").unwrap();
        dir.create("paper-1.20.1-123.jar.old.3", b"d").unwrap();
        let jar = dir.create("paper-1.20.1-123.jar", b"current").unwrap();
        let before = dir.names().unwrap();

        let manager = BackupManager::new(dir.path().to_path_buf(), "jar");
        let archived = manager.archive(&jar).await.unwrap();

        assert_eq!(display_name(&archived), "paper-1.20.1-123.jar.old.2");
        let after = dir.names().unwrap();
        assert_eq!(after.len(), before.len());
        assert_eq!(dir.read("paper-1.20.1-123.jar.old.3").unwrap(), b"d");
    }

    #[tokio::test]
    async fn test_archive_missing_file() {
        let dir = InstallDir::new().unwrap();
        let manager = BackupManager::new(dir.path().to_path_buf(), "jar");

        let result = manager.archive(&dir.path().join("missing.jar")).await;
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_restore_nothing() {
        let dir = InstallDir::new().unwrap();
        dir.create("paper-1.20.1-124.jar", b"current").unwrap();
        let manager = BackupManager::new(dir.path().to_path_buf(), "jar");

        assert_eq!(manager.restore().await.unwrap(), None);
        assert_eq!(dir.names().unwrap(), vec!["paper-1.20.1-124.jar"]);
    }

    #[tokio::test]
    async fn test_restore_picks_newest_and_archives_current() {
        let dir = InstallDir::new().unwrap();
        let t1 = dir.create("paper-1.20.1-122.jar.old", b"v122").unwrap();
        let t2 = dir.create("paper-1.20.1-123.jar.old.1", b"v123").unwrap();
        dir.set_age(&t1, Duration::from_secs(7200)).unwrap();
        dir.set_age(&t2, Duration::from_secs(3600)).unwrap();
        dir.create("paper-1.20.1-124.jar", b"v124").unwrap();

        let manager = BackupManager::new(dir.path().to_path_buf(), "jar");
        let restored = manager.restore().await.unwrap().unwrap();

        assert_eq!(restored, dir.path().join("paper-1.20.1-123.jar"));
        assert_eq!(dir.read("paper-1.20.1-123.jar").unwrap(), b"v123");
        assert_eq!(dir.read("paper-1.20.1-124.jar.old").unwrap(), b"v124");
        assert_eq!(dir.read("paper-1.20.1-122.jar.old").unwrap(), b"v122");
    }

    #[tokio::test]
    async fn test_restore_after_interruption_follows_mtime() {
        // Current artifact archived, backup not yet renamed into place
        let dir = InstallDir::new().unwrap();
        let just_archived = dir.create("paper-1.20.1-124.jar.old", b"v124").unwrap();
        let backup = dir.create("paper-1.20.1-123.jar.old.1", b"v123").unwrap();
        dir.set_age(&just_archived, Duration::from_secs(7200)).unwrap();
        dir.set_age(&backup, Duration::from_secs(3600)).unwrap();

        let manager = BackupManager::new(dir.path().to_path_buf(), "jar");
        let restored = manager.restore().await.unwrap().unwrap();

        assert_eq!(restored, dir.path().join("paper-1.20.1-123.jar"));
        assert_eq!(dir.names().unwrap(), vec!["paper-1.20.1-123.jar", "paper-1.20.1-124.jar.old"]);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let dir = InstallDir::new().unwrap();
        let a = dir.create("paper-1.20.1-121.jar.old", b"a").unwrap();
        let b = dir.create("paper-1.20.1-122.jar.old", b"b").unwrap();
        dir.set_age(&a, Duration::from_secs(500)).unwrap();
        dir.set_age(&b, Duration::from_secs(5)).unwrap();

        let manager = BackupManager::new(dir.path().to_path_buf(), "jar");
        let entries = manager.list().await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, b);
        assert_eq!(entries[0].version, Some(VersionTag::new("1.20.1", 122)));
        assert_eq!(entries[1].path, a);
    }

    #[test]
    fn test_restore_target() {
        let target = restore_target(Path::new("/srv/paper-1.20.1-123.jar.old.2")).unwrap();
        assert_eq!(target, Path::new("/srv/paper-1.20.1-123.jar"));
        assert!(restore_target(Path::new("/srv/paper-1.20.1-123.jar")).is_err());
    }
}
