//! Global constants used throughout the paperup codebase.
//!
//! File-name suffixes that encode an artifact's role, default endpoints and
//! timeouts. Defining them centrally keeps the on-disk naming scheme in one
//! place.

use std::time::Duration;

/// Suffix marking a downloaded artifact awaiting promotion.
pub const STAGED_SUFFIX: &str = ".new";

/// Marker for archived artifacts (`.old`, `.old.1`, `.old.2`, ...).
///
/// Restore truncates an archive name at the first occurrence of this marker.
pub const ARCHIVED_MARKER: &str = ".old";

/// Suffix of the sidecar manifest that accompanies a staged artifact.
///
/// Appended to the staged file name, e.g. `paper-1.21.4-100.jar.new.json`.
pub const STAGING_MANIFEST_SUFFIX: &str = ".json";

/// Default artifact file extension (without the dot).
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "jar";

/// Default upstream project on the Fill API.
pub const DEFAULT_PROJECT: &str = "paper";

/// Root of the PaperMC Fill v3 API.
pub const DEFAULT_API_BASE_URL: &str = "https://fill.papermc.io/v3";

/// Download key used by Fill for the server jar.
pub const SERVER_DOWNLOAD_KEY: &str = "server:default";

/// Default HTTP timeout for metadata requests and jar downloads (5 minutes).
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Environment variable naming the default install directory.
pub const ENV_INSTALL_DIR: &str = "PAPER_DIR";

/// Environment variable overriding the configuration file location.
pub const ENV_CONFIG_PATH: &str = "PAPERUP_CONFIG_PATH";

/// Environment variable disabling progress bars when set to any value.
pub const ENV_NO_PROGRESS: &str = "PAPERUP_NO_PROGRESS";
