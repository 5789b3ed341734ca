//! Error handling for paperup
//!
//! This module provides the typed error enum for update and restore cycles and
//! the user-friendly reporting used by the CLI. The error system follows two
//! principles:
//! 1. **Strongly-typed errors** so callers can tell a retryable remote failure
//!    from a filesystem fault
//! 2. **User-friendly messages** with actionable suggestions for operators
//!
//! # Error Categories
//!
//! - **Remote**: [`UpdaterError::Discovery`], [`UpdaterError::Transfer`]. The cycle
//!   aborts without touching the current artifact and can simply be re-run.
//! - **File system**: [`UpdaterError::FileSystemError`], [`UpdaterError::DirectoryNotFound`].
//!   The directory is left in whatever state the
//!   last successful rename produced.
//! - **Install directory invariants**: [`UpdaterError::AmbiguousCurrentArtifact`].
//! - **Integrity**: [`UpdaterError::ChecksumMismatch`], [`UpdaterError::SizeMismatch`].
//! - **Configuration**: [`UpdaterError::ConfigError`].
//!
//! Library functions return [`anyhow::Result`] and attach context with
//! [`anyhow::Context`]; the typed variant stays reachable through
//! [`anyhow::Error::downcast_ref`] or by walking [`anyhow::Error::chain`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use paperup_cli::core::{UpdaterError, user_friendly_error};
//!
//! let error = UpdaterError::Discovery {
//!     operation: "fetch project versions".to_string(),
//!     reason: "connection refused".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for paperup operations
#[derive(Error, Debug, Clone)]
pub enum UpdaterError {
    /// Remote metadata was unreachable or malformed
    ///
    /// Raised while asking the release source for the latest build or for the
    /// download details of a build. Retryable by re-running the cycle.
    #[error("Failed to {operation}: {reason}")]
    Discovery {
        /// What was being asked of the release source
        operation: String,
        /// Why it failed
        reason: String,
    },

    /// Artifact download failed or was interrupted
    ///
    /// A truncated `.new` file may remain; its staging manifest makes the next
    /// cycle reject it and download again.
    #[error("Failed to download {url}: {reason}")]
    Transfer {
        /// URL being downloaded
        url: String,
        /// Why the transfer failed
        reason: String,
    },

    /// A rename or other filesystem mutation was rejected
    #[error("File system error: {operation} ({path})")]
    FileSystemError {
        /// The operation that failed (e.g. "archive", "promote")
        operation: String,
        /// Path the operation was applied to
        path: String,
    },

    /// More than one file qualifies as the current artifact
    ///
    /// Exactly one active artifact per directory is required; picking one by
    /// filesystem order would archive or keep the wrong jar.
    #[error("Found {} candidate server artifacts in {dir}: {}", .candidates.len(), .candidates.join(", "))]
    AmbiguousCurrentArtifact {
        /// Install directory that was scanned
        dir: String,
        /// File names that all qualify as current
        candidates: Vec<String>,
    },

    /// Staged artifact content does not match the published checksum
    #[error("Checksum mismatch for '{file}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Staged file that failed verification
        file: String,
        /// Checksum published by the release source
        expected: String,
        /// Checksum of the bytes on disk
        actual: String,
    },

    /// Staged artifact length does not match the published size
    #[error("Size mismatch for '{file}': expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Staged file that failed verification
        file: String,
        /// Size published by the release source
        expected: u64,
        /// Size on disk
        actual: u64,
    },

    /// The install directory does not exist
    #[error("Directory does not exist: {path}")]
    DirectoryNotFound {
        /// The missing directory
        path: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl UpdaterError {
    /// Whether re-running the cycle later may succeed without operator action.
    ///
    /// Remote failures leave the install directory untouched (or with a
    /// rejected staged file), so the next scheduled invocation retries them.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Discovery { .. } | Self::Transfer { .. })
    }
}

/// Error wrapper carrying a suggestion and extra details for display
///
/// # Examples
///
/// ```rust,no_run
/// use paperup_cli::core::{UpdaterError, ErrorContext};
///
/// let context = ErrorContext::new(UpdaterError::DirectoryNotFound {
///     path: "/srv/paper".to_string(),
/// })
/// .with_suggestion("Pass the server directory with --dir");
///
/// println!("{}", context);
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UpdaterError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details
    #[must_use]
    pub const fn new(error: UpdaterError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Find the typed [`UpdaterError`] anywhere in an error's context chain.
///
/// Checks context layers attached with [`anyhow::Context`] as well as the
/// `source()` chain of the root cause.
pub fn find_updater_error(error: &anyhow::Error) -> Option<&UpdaterError> {
    error
        .downcast_ref::<UpdaterError>()
        .or_else(|| error.chain().find_map(|cause| cause.downcast_ref::<UpdaterError>()))
}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`UpdaterError`] variants anywhere in the chain, then
/// [`std::io::Error`] kinds, and falls back to the full error chain for
/// anything else.
///
/// # Examples
///
/// ```rust,no_run
/// use paperup_cli::core::user_friendly_error;
/// use std::io::{Error, ErrorKind};
///
/// let io_error = Error::new(ErrorKind::PermissionDenied, "access denied");
/// let context = user_friendly_error(anyhow::Error::from(io_error));
///
/// context.display(); // Shows permission-related suggestions
/// ```
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(updater_error) = find_updater_error(&error) {
        let ctx = create_error_context(updater_error.clone());
        // Keep the outer context (which file, which step) visible
        if error.chain().count() > 1 {
            let chain = format_chain(&error);
            let details = match &ctx.details {
                Some(details) => format!("{details}\n{chain}"),
                None => chain,
            };
            return ctx.with_details(details);
        }
        return ctx;
    }

    let io_error = error
        .downcast_ref::<std::io::Error>()
        .or_else(|| error.chain().find_map(|c| c.downcast_ref::<std::io::Error>()));
    if let Some(io_error) = io_error {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(UpdaterError::FileSystemError {
                    operation: error.to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Run paperup as the user that owns the server directory, or fix the directory permissions")
                .with_details(format_chain(&error));
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(UpdaterError::FileSystemError {
                    operation: error.to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the server directory exists and that no other process moved the jar")
                .with_details(format_chain(&error));
            }
            _ => {}
        }
    }

    ErrorContext::new(UpdaterError::Other {
        message: format_chain(&error),
    })
}

/// Render an error and its causes as `msg\n\nCaused by:\n  1: ...`.
fn format_chain(error: &anyhow::Error) -> String {
    let mut message = error.to_string();

    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    message
}

/// Attach the tailored suggestion for each [`UpdaterError`] variant
fn create_error_context(error: UpdaterError) -> ErrorContext {
    let (suggestion, details): (Option<String>, Option<&str>) = match &error {
        UpdaterError::Discovery { .. } => (
            Some("Check your internet connection and that the Fill API is reachable; the next run will retry".to_string()),
            Some("No update was performed and the installed jar was not touched"),
        ),
        UpdaterError::Transfer { .. } => (
            Some("Re-run paperup; a partially downloaded .new file is verified and replaced on the next run".to_string()),
            Some("The installed jar was not touched"),
        ),
        UpdaterError::AmbiguousCurrentArtifact { dir, .. } => (
            Some(format!(
                "Keep exactly one server jar in {dir}; rename the others with a .old suffix or move them away"
            )),
            Some("paperup needs to know which jar is active before archiving or replacing it"),
        ),
        UpdaterError::ChecksumMismatch { .. } | UpdaterError::SizeMismatch { .. } => (
            Some("Re-run paperup to download the build again".to_string()),
            Some("The corrupted download was discarded and the installed jar was not touched"),
        ),
        UpdaterError::DirectoryNotFound { .. } => {
            (Some("Pass the server directory with --dir or set PAPER_DIR".to_string()), None)
        }
        UpdaterError::ConfigError { .. } => (
            Some("Check the paperup config file (see --config / PAPERUP_CONFIG_PATH)".to_string()),
            None,
        ),
        UpdaterError::FileSystemError { .. } => (
            Some("Check permissions and free space in the server directory; re-running is safe".to_string()),
            None,
        ),
        UpdaterError::Other { .. } => (None, None),
    };

    let mut ctx = ErrorContext::new(error);
    ctx.suggestion = suggestion;
    ctx.details = details.map(str::to_string);
    ctx
}
