use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_ARTIFACT_EXTENSION, DEFAULT_HTTP_TIMEOUT, DEFAULT_PROJECT,
};

/// Settings that control how an install directory is kept up to date.
///
/// `UpdaterConfig` is passed explicitly into the [`Updater`](crate::upgrade::Updater)
/// and the [`FillClient`](crate::source::FillClient); nothing in the update
/// path reads process-wide state.
///
/// # Default Behavior
///
/// - Track the `paper` project on the public Fill v3 API
/// - Treat `*.jar` files as artifacts
/// - Verify staged downloads against the published size and SHA-256
/// - Give up on HTTP requests after 5 minutes
///
/// # TOML Example
///
/// ```toml
/// [updater]
/// project = "paper"
/// api_base_url = "https://fill.papermc.io/v3"
/// artifact_extension = "jar"
/// verify_checksum = true
/// timeout_secs = 300
/// user_agent = "paperup/0.1.0 (admin@example.com)"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Fill project identifier (`paper`, `folia`, `velocity`, ...).
    #[serde(default = "default_project")]
    pub project: String,

    /// Root URL of the Fill v3 API, without a trailing slash.
    ///
    /// Overridable so a mirror or a local test server can stand in for
    /// `fill.papermc.io`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// File extension of server artifacts, without the leading dot.
    ///
    /// Only files with this extension are considered current, staged or
    /// archived artifacts; everything else in the directory is ignored.
    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: String,

    /// Whether staged downloads are checked against the published size and
    /// SHA-256 before promotion.
    ///
    /// # Default: `true`
    ///
    /// When enabled, a staging manifest is written next to each `.new` file
    /// before the transfer starts. A staged file that does not match its
    /// manifest is discarded and downloaded again instead of being promoted.
    #[serde(default = "default_verify_checksum")]
    pub verify_checksum: bool,

    /// HTTP timeout in seconds for metadata requests and downloads.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// `User-Agent` sent with every request.
    ///
    /// The Fill API asks clients to identify themselves; include a contact
    /// address when running against the public service.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            project: default_project(),
            api_base_url: default_api_base_url(),
            artifact_extension: default_artifact_extension(),
            verify_checksum: default_verify_checksum(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_project() -> String {
    DEFAULT_PROJECT.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_artifact_extension() -> String {
    DEFAULT_ARTIFACT_EXTENSION.to_string()
}

fn default_verify_checksum() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT.as_secs()
}

fn default_user_agent() -> String {
    format!("paperup/{}", env!("CARGO_PKG_VERSION"))
}

impl UpdaterConfig {
    /// HTTP timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Artifact extension normalised to have no leading dot.
    pub fn extension(&self) -> &str {
        self.artifact_extension.trim_start_matches('.')
    }
}
