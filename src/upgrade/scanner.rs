//! Install directory scanning.
//!
//! The role of every file in an install directory is encoded in its name:
//!
//! ```text
//! paper-1.20.1-124.jar           current   (no reserved suffix)
//! paper-1.20.1-125.jar.new       staged    (awaiting promotion)
//! paper-1.20.1-125.jar.new.json  staging manifest (not an artifact)
//! paper-1.20.1-123.jar.old       archived
//! paper-1.20.1-122.jar.old.1     archived  (numeric disambiguator)
//! ```
//!
//! [`ArtifactRole::classify`] is the single place that interprets these
//! suffixes; the `find_*` functions below only enumerate and filter.

use anyhow::{Context, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use crate::constants::{ARCHIVED_MARKER, STAGED_SUFFIX};
use crate::core::UpdaterError;

/// Role of a file in the install directory, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactRole {
    /// The active server artifact.
    Current,
    /// A downloaded artifact awaiting promotion (`.<ext>.new`).
    Staged,
    /// A superseded artifact kept for rollback (`.old`, `.old.N`).
    Archived,
}

impl ArtifactRole {
    /// Classify a file name for the given artifact extension.
    ///
    /// Returns `None` for files that play no role (other extensions, staging
    /// manifests, logs, ...). A `.new` file only counts as staged when the
    /// name underneath carries the artifact extension.
    pub fn classify(file_name: &str, extension: &str) -> Option<Self> {
        if file_name.ends_with(&format!(".{extension}{STAGED_SUFFIX}")) {
            return Some(Self::Staged);
        }

        let archived_marker = format!(".{extension}{ARCHIVED_MARKER}");
        if let Some(pos) = file_name.find(&archived_marker) {
            let rest = &file_name[pos + archived_marker.len()..];
            if rest.is_empty() || rest.starts_with('.') {
                return Some(Self::Archived);
            }
        }

        if file_name.ends_with(&format!(".{extension}")) {
            return Some(Self::Current);
        }

        None
    }
}

/// Find the current artifact in `dir`.
///
/// # Returns
///
/// - `Ok(None)` - no current artifact
/// - `Ok(Some(path))` - exactly one current artifact
/// - `Err` - [`UpdaterError::AmbiguousCurrentArtifact`] when several files
///   qualify, or an I/O error while listing the directory
pub fn find_current(dir: &Path, extension: &str) -> Result<Option<PathBuf>> {
    let mut candidates = glob_files(dir, &format!("*.{extension}"))?
        .into_iter()
        .filter(|path| role_of(path, extension) == Some(ArtifactRole::Current))
        .collect::<Vec<_>>();

    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        _ => {
            let names = candidates.iter().map(|p| display_name(p)).collect();
            Err(UpdaterError::AmbiguousCurrentArtifact {
                dir: dir.display().to_string(),
                candidates: names,
            }
            .into())
        }
    }
}

/// Find staged artifacts in `dir`, most recently modified first.
pub fn find_staged(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let staged = glob_files(dir, &format!("*.{extension}{STAGED_SUFFIX}"))?
        .into_iter()
        .filter(|path| role_of(path, extension) == Some(ArtifactRole::Staged))
        .collect();
    sort_newest_first(staged)
}

/// Find archived artifacts in `dir`, in no particular order.
pub fn find_archived(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let archived = glob_files(dir, &format!("*.{extension}{ARCHIVED_MARKER}*"))?
        .into_iter()
        .filter(|path| role_of(path, extension) == Some(ArtifactRole::Archived))
        .collect();
    Ok(archived)
}

/// Pick the most recently modified path.
pub fn latest_modified(paths: &[PathBuf]) -> Result<Option<PathBuf>> {
    let mut latest: Option<(SystemTime, &PathBuf)> = None;
    for path in paths {
        let modified = modified_time(path)?;
        if latest.is_none_or(|(time, _)| modified > time) {
            latest = Some((modified, path));
        }
    }
    Ok(latest.map(|(_, path)| path.clone()))
}

/// Last modification time of `path`.
pub fn modified_time(path: &Path) -> Result<SystemTime> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("Failed to read modification time of {}", path.display()))
}

fn sort_newest_first(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let mut stamped = paths
        .into_iter()
        .map(|path| modified_time(&path).map(|time| (time, path)))
        .collect::<Result<Vec<_>>>()?;
    stamped.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(stamped.into_iter().map(|(_, path)| path).collect())
}

fn role_of(path: &Path, extension: &str) -> Option<ArtifactRole> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| ArtifactRole::classify(name, extension))
}

/// Regular files directly inside `dir` whose name matches `file_pattern`.
fn glob_files(dir: &Path, file_pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/{}", Pattern::escape(&dir.to_string_lossy()), file_pattern);
    debug!("Scanning {}", pattern);

    let mut files = Vec::new();
    for entry in glob::glob(&pattern)
        .with_context(|| format!("Invalid scan pattern: {pattern}"))?
    {
        let path = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
