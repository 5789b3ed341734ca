//! Version tags parsed from artifact file names.
//!
//! Server jars published by Fill follow the `<name>-<version>-<build>.<ext>`
//! naming scheme, e.g. `paper-1.20.1-123.jar`. The installed version is never
//! recorded anywhere else, so the file name is the single source of truth for
//! what is currently running.
//!
//! # Parsing Rules
//!
//! - The final extension is stripped (`paper-1.20.1-123.jar` → `paper-1.20.1-123`)
//! - The stem is split on `-`; at least three tokens are required
//! - The last token is the build number (base-10, non-negative)
//! - The second-to-last token is the version identifier, taken verbatim
//!
//! Anything else yields `None`, which callers treat as "unknown version".
//!
//! # Examples
//!
//! ```rust,no_run
//! use paperup_cli::version::{VersionTag, parse_version};
//!
//! let tag = parse_version("paper-1.20.1-123.jar").unwrap();
//! assert_eq!(tag, VersionTag::new("1.20.1", 123));
//!
//! assert!(parse_version("paper.jar").is_none());
//! assert!(parse_version("paper-1.20.1-latest.jar").is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The (version identifier, build number) pair identifying an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionTag {
    /// Upstream version identifier, e.g. `1.20.1`.
    pub version: String,
    /// Build number within that version.
    pub build: u32,
}

impl VersionTag {
    /// Create a tag from its parts.
    pub fn new(version: impl Into<String>, build: u32) -> Self {
        Self {
            version: version.into(),
            build,
        }
    }

    /// Parse the tag from the file name component of `path`.
    ///
    /// Returns `None` when the path has no file name or the name does not
    /// follow the `<name>-<version>-<build>.<ext>` scheme.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name().and_then(|name| name.to_str()).and_then(parse_version)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.version, self.build)
    }
}

/// Parse a [`VersionTag`] from an artifact file name.
///
/// This is a total function: malformed names return `None` rather than an
/// error, since an unparseable current artifact simply forces a fresh
/// download.
pub fn parse_version(file_name: &str) -> Option<VersionTag> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;

    let tokens: Vec<&str> = stem.split('-').collect();
    if tokens.len() < 3 {
        return None;
    }

    let build = tokens[tokens.len() - 1].parse::<u32>().ok()?;
    let version = tokens[tokens.len() - 2];

    Some(VersionTag::new(version, build))
}
