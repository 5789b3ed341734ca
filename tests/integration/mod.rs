//! Integration test suite for paperup
//!
//! End-to-end tests that exercise the library through its public API and the
//! `paperup` binary through its command line. Nothing here touches the real
//! Fill API: library tests use [`MockSource`](paperup_cli::test_utils::MockSource)
//! and binary tests point the client at a local
//! [`StubServer`](paperup_cli::test_utils::StubServer).
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **lifecycle**: multi-run scenarios (update, interruption, recovery, restore)
//! - **cli**: the `paperup` binary, its modes and exit codes

mod cli;
mod lifecycle;
