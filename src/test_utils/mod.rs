//! Test utilities for paperup
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration test target.
//!
//! - [`InstallDir`] - temporary install directory with mtime control
//! - [`MockSource`] - scripted in-memory [`ReleaseSource`](crate::source::ReleaseSource)
//! - [`StubServer`] - canned-response HTTP server for the Fill client and CLI
//!
//! # Example
//!
//! ```rust,no_run
//! use paperup_cli::test_utils::{InstallDir, MockSource};
//! use paperup_cli::upgrade::{UpdaterConfig, Updater};
//! use paperup_cli::version::VersionTag;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let dir = InstallDir::new()?;
//! dir.create("paper-1.20.1-123.jar", b"old")?;
//!
//! let source = MockSource::new(VersionTag::new("1.20.1", 124), b"new".to_vec());
//! let updater = Updater::new(dir.path(), UpdaterConfig::default(), source);
//! updater.update_cycle().await?;
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod mock_source;
pub mod stub_server;

pub use fixtures::{DirSnapshot, InstallDir};
pub use mock_source::MockSource;
pub use stub_server::StubServer;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=paperup_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}
