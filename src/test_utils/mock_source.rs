//! Scripted [`ReleaseSource`] for orchestrator tests.

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::UpdaterError;
use crate::source::{DownloadInfo, ReleaseSource};
use crate::version::VersionTag;

#[derive(Debug, Clone)]
enum DownloadBehavior {
    Complete,
    /// Write only the first N bytes but report success.
    Truncated(usize),
    /// Write the first N bytes, then fail.
    Interrupted(usize),
    /// Fail before creating the destination.
    Refused,
}

#[derive(Debug)]
struct MockState {
    latest: Option<VersionTag>,
    payload: Vec<u8>,
    behavior: DownloadBehavior,
    calls: Vec<String>,
}

/// A release source that serves one build from memory.
///
/// Every call is recorded so tests can assert that, for example, an
/// up-to-date cycle never resolved or downloaded anything.
///
/// # Example
///
/// ```rust,no_run
/// use paperup_cli::test_utils::MockSource;
/// use paperup_cli::version::VersionTag;
///
/// let source = MockSource::new(VersionTag::new("1.20.1", 124), b"jar bytes".to_vec());
/// assert_eq!(source.file_name(), "paper-1.20.1-124.jar");
/// ```
#[derive(Debug, Clone)]
pub struct MockSource {
    state: Arc<Mutex<MockState>>,
}

impl MockSource {
    /// Serve `latest` with `payload` as its artifact, publishing size and SHA-256.
    pub fn new(latest: VersionTag, payload: impl Into<Vec<u8>>) -> Self {
        Self::from_state(MockState {
            latest: Some(latest),
            payload: payload.into(),
            behavior: DownloadBehavior::Complete,
            calls: Vec::new(),
        })
    }

    /// A source whose metadata endpoint is down.
    pub fn unreachable() -> Self {
        Self::from_state(MockState {
            latest: None,
            payload: Vec::new(),
            behavior: DownloadBehavior::Complete,
            calls: Vec::new(),
        })
    }

    fn from_state(state: MockState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Silently write only `len` bytes on download.
    #[must_use]
    pub fn with_truncated_download(self, len: usize) -> Self {
        self.lock().behavior = DownloadBehavior::Truncated(len);
        self
    }

    /// Write `len` bytes, then fail the download with a transfer error.
    #[must_use]
    pub fn with_interrupted_download(self, len: usize) -> Self {
        self.lock().behavior = DownloadBehavior::Interrupted(len);
        self
    }

    /// Fail the download with a transfer error without writing anything.
    #[must_use]
    pub fn with_refused_download(self) -> Self {
        self.lock().behavior = DownloadBehavior::Refused;
        self
    }

    /// Let subsequent downloads complete normally.
    pub fn heal(&self) {
        self.lock().behavior = DownloadBehavior::Complete;
    }

    /// Canonical file name of the served build.
    pub fn file_name(&self) -> String {
        self.lock()
            .latest
            .as_ref()
            .map(|tag| format!("paper-{}-{}.jar", tag.version, tag.build))
            .unwrap_or_default()
    }

    /// Recorded calls, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of download calls.
    pub fn download_count(&self) -> usize {
        self.lock().calls.iter().filter(|call| call.starts_with("download")).count()
    }
}

impl ReleaseSource for MockSource {
    async fn latest_build(&self) -> Result<VersionTag> {
        let mut state = self.lock();
        state.calls.push("latest_build".to_string());
        state.latest.clone().ok_or_else(|| {
            UpdaterError::Discovery {
                operation: "fetch project versions".to_string(),
                reason: "connection refused".to_string(),
            }
            .into()
        })
    }

    async fn resolve_download(&self, build: &VersionTag) -> Result<DownloadInfo> {
        let file_name = self.file_name();
        let mut state = self.lock();
        state.calls.push(format!("resolve_download {build}"));

        Ok(DownloadInfo {
            url: format!("https://fill-data.example.test/{file_name}"),
            file_name,
            sha256: Some(hex::encode(Sha256::digest(&state.payload))),
            size: Some(state.payload.len() as u64),
        })
    }

    async fn download(&self, info: &DownloadInfo, destination: &Path) -> Result<u64> {
        let (bytes, behavior) = {
            let mut state = self.lock();
            state.calls.push(format!("download {}", info.file_name));
            (state.payload.clone(), state.behavior.clone())
        };

        let written = match behavior {
            DownloadBehavior::Complete => bytes.len(),
            DownloadBehavior::Truncated(len) | DownloadBehavior::Interrupted(len) => {
                len.min(bytes.len())
            }
            DownloadBehavior::Refused => {
                return Err(UpdaterError::Transfer {
                    url: info.url.clone(),
                    reason: "HTTP 503 Service Unavailable".to_string(),
                }
                .into());
            }
        };
        tokio::fs::write(destination, &bytes[..written]).await?;

        if let DownloadBehavior::Interrupted(_) = behavior {
            return Err(UpdaterError::Transfer {
                url: info.url.clone(),
                reason: "connection reset by peer".to_string(),
            }
            .into());
        }

        Ok(written as u64)
    }
}
