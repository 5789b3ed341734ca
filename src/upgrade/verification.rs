use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::constants::STAGING_MANIFEST_SUFFIX;
use crate::core::UpdaterError;
use crate::source::DownloadInfo;
use crate::upgrade::scanner::display_name;

/// Verifies the integrity of a staged artifact using its SHA-256 checksum.
///
/// A transfer interrupted by a crash leaves a truncated `.new` file that
/// looks exactly like a finished one. Comparing it against the size and
/// checksum published by the release source is what keeps such a file from
/// being promoted.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Compute the SHA-256 checksum of a file as lowercase hex.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use paperup_cli::upgrade::verification::ChecksumVerifier;
    /// use std::path::Path;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let checksum = ChecksumVerifier::compute_sha256(Path::new("paper-1.21.4-100.jar")).await?;
    /// println!("SHA256: {}", checksum);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn compute_sha256(file_path: &Path) -> Result<String> {
        debug!("Computing SHA256 checksum for: {:?}", file_path);

        let mut file = fs::File::open(file_path)
            .await
            .with_context(|| format!("Failed to read file: {file_path:?}"))?;

        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let read = file
                .read(&mut buffer)
                .await
                .with_context(|| format!("Failed to read file: {file_path:?}"))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Verify a file against an expected SHA-256 checksum.
    ///
    /// The comparison is case-insensitive and tolerates a `sha256:` prefix on
    /// the expected value.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::ChecksumMismatch`] when the checksums differ.
    pub async fn verify_checksum(file_path: &Path, expected_checksum: &str) -> Result<()> {
        info!("Verifying checksum for: {}", display_name(file_path));

        let actual = Self::compute_sha256(file_path).await?;
        let expected = expected_checksum.trim_start_matches("sha256:");

        if !actual.eq_ignore_ascii_case(expected) {
            return Err(UpdaterError::ChecksumMismatch {
                file: display_name(file_path),
                expected: expected.to_lowercase(),
                actual,
            }
            .into());
        }

        info!("Checksum verification successful");
        Ok(())
    }
}

/// Expected size and checksum of a staged artifact.
///
/// Written as `<staged>.json` before the transfer starts, so a staged file
/// left behind by an interrupted download always has something to be checked
/// against. Removed together with the staged file on promotion or discard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingManifest {
    /// URL the artifact was downloaded from.
    pub url: String,
    /// Canonical artifact name the staged file will be promoted to.
    pub file_name: String,
    /// Published SHA-256 (hex), if the release source supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Published size in bytes, if the release source supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl StagingManifest {
    /// Build the manifest for a download about to be staged.
    pub fn from_download(info: &DownloadInfo) -> Self {
        Self {
            url: info.url.clone(),
            file_name: info.file_name.clone(),
            sha256: info.sha256.clone(),
            size: info.size,
        }
    }

    /// Sidecar path for a staged artifact.
    pub fn path_for(staged: &Path) -> PathBuf {
        let mut name = staged.as_os_str().to_os_string();
        name.push(STAGING_MANIFEST_SUFFIX);
        PathBuf::from(name)
    }

    /// Load the manifest of `staged`, if one exists.
    pub async fn load(staged: &Path) -> Result<Option<Self>> {
        let path = Self::path_for(staged);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read staging manifest {}", path.display()))?;
        let manifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse staging manifest {}", path.display()))?;
        Ok(Some(manifest))
    }

    /// Write the manifest next to `staged`.
    pub async fn save(&self, staged: &Path) -> Result<()> {
        let path = Self::path_for(staged);
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize staging manifest")?;
        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write staging manifest {}", path.display()))
    }

    /// Remove the manifest of `staged`; a missing manifest is not an error.
    pub async fn remove(staged: &Path) -> Result<()> {
        let path = Self::path_for(staged);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove staging manifest {}", path.display())),
        }
    }

    /// Check `staged` against the recorded size and checksum.
    ///
    /// Size is compared first so a truncated file is rejected without hashing.
    pub async fn verify(&self, staged: &Path) -> Result<()> {
        if let Some(expected) = self.size {
            let actual = fs::metadata(staged)
                .await
                .with_context(|| format!("Failed to stat staged artifact {}", staged.display()))?
                .len();
            if actual != expected {
                return Err(UpdaterError::SizeMismatch {
                    file: display_name(staged),
                    expected,
                    actual,
                }
                .into());
            }
        }

        if let Some(expected) = &self.sha256 {
            ChecksumVerifier::verify_checksum(staged, expected).await?;
        }

        Ok(())
    }
}
