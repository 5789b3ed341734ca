//! Server artifact updates for an install directory.
//!
//! This module keeps a server jar in sync with the latest published build
//! while keeping every superseded jar around for rollback.
//!
//! # Architecture Overview
//!
//! - **[`scanner`]**: classifies files in the install directory by role
//!   (current, staged, archived) and finds them
//! - **[`backup::BackupManager`]**: archives superseded artifacts under
//!   collision-free `.old` names and restores the newest one
//! - **[`verification`]**: records the published size and SHA-256 of a staged
//!   artifact and checks the file against it before promotion
//! - **[`Updater`]**: the update cycle tying the above to a
//!   [`ReleaseSource`](crate::source::ReleaseSource)
//! - **[`config::UpdaterConfig`]**: settings passed explicitly into the updater
//!
//! ## Update Process Flow
//!
//! ```text
//! 1. Recover staged
//!    └── A `.new` file from an earlier run is verified and promoted first
//!
//! 2. Version check
//!    ├── Ask the release source for the latest build
//!    └── Compare with the version in the current artifact's name
//!
//! 3. Download
//!    ├── Write the staging manifest (`<name>.new.json`)
//!    ├── Stream the artifact to `<name>.new`
//!    └── Reject it if size or checksum do not match
//!
//! 4. Promote
//!    ├── Archive the current artifact to `<name>.old[.N]`
//!    └── Rename `<name>.new` to `<name>`
//! ```
//!
//! # Safety Mechanisms
//!
//! - Every mutation is a single `rename`; nothing is copied or deleted except
//!   a staged file that failed verification
//! - Archive names are tried until one is free, so no archive is overwritten
//! - A directory with more than one current artifact is refused rather than
//!   guessed at
//!
//! # Usage
//!
//! ```bash
//! paperup --dir /srv/paper            # Update to the latest build
//! paperup --dir /srv/paper --check    # Report versions only
//! paperup --dir /srv/paper --restore  # Roll back to the newest archive
//! ```

pub mod backup;
pub mod config;
pub mod scanner;
pub mod updater;
pub mod verification;

pub use backup::{ArchiveEntry, BackupManager};
pub use config::UpdaterConfig;
pub use scanner::ArtifactRole;
pub use updater::{RestoreOutcome, UpdateCheck, UpdateOutcome, Updater};
pub use verification::{ChecksumVerifier, StagingManifest};
