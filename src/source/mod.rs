//! Release sources for server artifacts.
//!
//! A release source answers three questions for the update cycle: which build
//! is the latest, where can a given build be downloaded, and what are its
//! bytes. [`ReleaseSource`] is the seam between the orchestrator and the
//! network; [`FillClient`] implements it against the PaperMC Fill v3 API and
//! tests substitute a scripted source.
//!
//! # Errors
//!
//! Implementations report metadata failures as
//! [`UpdaterError::Discovery`](crate::core::UpdaterError::Discovery) and
//! failed or interrupted downloads as
//! [`UpdaterError::Transfer`](crate::core::UpdaterError::Transfer). Neither
//! retries internally.

pub mod fill;

pub use fill::FillClient;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;

use crate::version::VersionTag;

/// Where and how to download one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadInfo {
    /// Direct download URL.
    pub url: String,
    /// Canonical artifact file name, e.g. `paper-1.21.4-100.jar`.
    pub file_name: String,
    /// Published SHA-256 of the artifact (hex), when known.
    pub sha256: Option<String>,
    /// Published size in bytes, when known.
    pub size: Option<u64>,
}

/// Discovery and transfer of server artifacts.
pub trait ReleaseSource {
    /// Latest published build as a version tag.
    fn latest_build(&self) -> impl Future<Output = Result<VersionTag>> + Send;

    /// Download details for one build.
    fn resolve_download(
        &self,
        build: &VersionTag,
    ) -> impl Future<Output = Result<DownloadInfo>> + Send;

    /// Stream the artifact to `destination`, returning the number of bytes written.
    ///
    /// `destination` is truncated first. A failed transfer may leave a partial
    /// file behind.
    fn download(
        &self,
        info: &DownloadInfo,
        destination: &Path,
    ) -> impl Future<Output = Result<u64>> + Send;
}
