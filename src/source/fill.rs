//! PaperMC Fill v3 client.
//!
//! Two metadata endpoints are used:
//!
//! ```text
//! GET {api}/projects/{project}/versions
//!     {"versions": [{"version": {"id": "1.21.4"}, "builds": [100, 99, ...]}, ...]}
//!
//! GET {api}/projects/{project}/versions/{version}/builds/{build}
//!     {"id": 100, "downloads": {"server:default": {
//!         "name": "paper-1.21.4-100.jar",
//!         "url": "https://fill-data.papermc.io/...",
//!         "checksums": {"sha256": "..."},
//!         "size": 51234567}}}
//! ```
//!
//! The first entry of `versions` is the newest version. The order of its
//! `builds` array is not relied upon; the highest build number wins.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::{DownloadInfo, ReleaseSource};
use crate::constants::SERVER_DOWNLOAD_KEY;
use crate::core::UpdaterError;
use crate::upgrade::UpdaterConfig;
use crate::utils::progress::ProgressBar;
use crate::version::VersionTag;

#[derive(Debug, Deserialize)]
struct ProjectVersions {
    versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
struct VersionEntry {
    version: VersionId,
    #[serde(default)]
    builds: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct VersionId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct BuildDetails {
    #[serde(default)]
    downloads: HashMap<String, DownloadEntry>,
}

#[derive(Debug, Deserialize)]
struct DownloadEntry {
    name: String,
    url: String,
    #[serde(default)]
    checksums: Checksums,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct Checksums {
    #[serde(default)]
    sha256: Option<String>,
}

fn discovery(operation: &str, reason: impl ToString) -> anyhow::Error {
    UpdaterError::Discovery {
        operation: operation.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

fn transfer(url: &str, reason: impl ToString) -> anyhow::Error {
    UpdaterError::Transfer {
        url: url.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Pick the latest build out of a `versions` payload.
fn parse_latest_build(body: &str) -> Result<VersionTag> {
    const OPERATION: &str = "read project versions";

    let payload: ProjectVersions = serde_json::from_str(body)
        .map_err(|e| discovery(OPERATION, format!("malformed response: {e}")))?;
    let latest = payload
        .versions
        .into_iter()
        .next()
        .ok_or_else(|| discovery(OPERATION, "project has no versions"))?;
    let build = latest.builds.iter().copied().max().ok_or_else(|| {
        discovery(OPERATION, format!("version {} has no builds", latest.version.id))
    })?;

    Ok(VersionTag::new(latest.version.id, build))
}

/// Extract the server download out of a build payload.
fn parse_download_info(body: &str, build: &VersionTag) -> Result<DownloadInfo> {
    let operation = format!("read build {build}");

    let mut payload: BuildDetails = serde_json::from_str(body)
        .map_err(|e| discovery(&operation, format!("malformed response: {e}")))?;
    let entry = payload
        .downloads
        .remove(SERVER_DOWNLOAD_KEY)
        .ok_or_else(|| discovery(&operation, format!("no '{SERVER_DOWNLOAD_KEY}' download")))?;

    Ok(DownloadInfo {
        url: entry.url,
        file_name: entry.name,
        sha256: entry.checksums.sha256,
        size: entry.size,
    })
}

/// [`ReleaseSource`] backed by the PaperMC Fill v3 API.
///
/// # Examples
///
/// ```rust,no_run
/// use paperup_cli::source::{FillClient, ReleaseSource};
/// use paperup_cli::upgrade::UpdaterConfig;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = FillClient::new(&UpdaterConfig::default())?;
/// let latest = client.latest_build().await?;
/// println!("Latest paper build: {latest}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FillClient {
    client: reqwest::Client,
    api_base_url: String,
    project: String,
    show_progress: bool,
}

impl FillClient {
    /// Build a client from the updater settings.
    ///
    /// The `User-Agent` and timeout apply to metadata requests and downloads
    /// alike. Progress display is on; see [`FillClient::with_progress`].
    pub fn new(config: &UpdaterConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            project: config.project.clone(),
            show_progress: true,
        })
    }

    /// Enable or disable the download progress bar.
    #[must_use]
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    fn versions_url(&self) -> String {
        format!("{}/projects/{}/versions", self.api_base_url, self.project)
    }

    fn build_url(&self, build: &VersionTag) -> String {
        format!(
            "{}/projects/{}/versions/{}/builds/{}",
            self.api_base_url, self.project, build.version, build.build
        )
    }

    async fn get_text(&self, url: &str, operation: &str) -> Result<String> {
        debug!("GET {}", url);

        let response =
            self.client.get(url).send().await.map_err(|e| discovery(operation, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(discovery(operation, format!("{url} returned HTTP {status}")));
        }

        response.text().await.map_err(|e| discovery(operation, e))
    }
}

impl ReleaseSource for FillClient {
    async fn latest_build(&self) -> Result<VersionTag> {
        let spinner = ProgressBar::new_spinner(self.show_progress);
        spinner.set_message(format!("Checking for the latest {} build...", self.project));

        let result = self
            .get_text(&self.versions_url(), "fetch project versions")
            .await
            .and_then(|body| parse_latest_build(&body));
        spinner.finish_and_clear();

        let latest = result?;
        debug!("Latest {} build is {}", self.project, latest);
        Ok(latest)
    }

    async fn resolve_download(&self, build: &VersionTag) -> Result<DownloadInfo> {
        let operation = format!("fetch build {build}");
        let body = self.get_text(&self.build_url(build), &operation).await?;
        parse_download_info(&body, build)
    }

    async fn download(&self, info: &DownloadInfo, destination: &Path) -> Result<u64> {
        info!("Downloading {} from {}", info.file_name, info.url);

        let mut response = self
            .client
            .get(&info.url)
            .send()
            .await
            .map_err(|e| transfer(&info.url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(transfer(&info.url, format!("HTTP {status}")));
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .with_context(|| format!("Failed to create {}", destination.display()))?;

        let total = response.content_length().or(info.size);
        let progress = ProgressBar::new_download(total, self.show_progress);
        progress.set_prefix(info.file_name.clone());

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| transfer(&info.url, e))? {
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write {}", destination.display()))?;
            written += chunk.len() as u64;
            progress.inc(chunk.len() as u64);
        }

        file.flush()
            .await
            .with_context(|| format!("Failed to write {}", destination.display()))?;
        progress.finish_and_clear();

        info!("Downloaded {} bytes to {}", written, destination.display());
        Ok(written)
    }
}
