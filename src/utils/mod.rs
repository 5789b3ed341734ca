//! Terminal utilities.
//!
//! # Modules
//!
//! - [`progress`] - Progress bars and spinners for downloads and metadata lookups

pub mod progress;

pub use progress::{ProgressBar, ProgressStyle};
