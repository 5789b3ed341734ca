//! Core types shared across paperup.
//!
//! Currently this is the error taxonomy and the user-facing error reporting
//! used by the CLI entry point.

pub mod error;

pub use error::{ErrorContext, UpdaterError, find_updater_error, user_friendly_error};
