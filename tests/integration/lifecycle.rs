//! Multi-run scenarios: updates, interrupted runs and rollbacks.
//!
//! Each test drives several cycles against the same install directory and
//! checks the directory between them, the way cron would run paperup.

use paperup_cli::core::{UpdaterError, find_updater_error};
use paperup_cli::source::DownloadInfo;
use paperup_cli::test_utils::{InstallDir, MockSource, init_test_logging};
use paperup_cli::upgrade::{
    RestoreOutcome, StagingManifest, UpdateOutcome, Updater, UpdaterConfig,
};
use paperup_cli::version::VersionTag;
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

fn updater(dir: &InstallDir, source: MockSource) -> Updater<MockSource> {
    Updater::new(dir.path(), UpdaterConfig::default(), source)
}

#[tokio::test]
async fn test_update_then_restore_brings_back_previous_build() {
    init_test_logging(None);
    let dir = InstallDir::new().unwrap();
    let old = dir.create("paper-1.20.1-123.jar", b"build 123").unwrap();
    dir.set_age(&old, HOUR).unwrap();

    let source = MockSource::new(VersionTag::new("1.20.1", 124), b"build 124".to_vec());
    let outcome = updater(&dir, source).update_cycle().await.unwrap();
    assert!(matches!(outcome, UpdateOutcome::Updated { .. }));
    assert_eq!(dir.names().unwrap(), vec!["paper-1.20.1-123.jar.old", "paper-1.20.1-124.jar"]);

    let outcome = updater(&dir, MockSource::unreachable()).restore_cycle().await.unwrap();
    assert_eq!(outcome, RestoreOutcome::Restored(dir.path().join("paper-1.20.1-123.jar")));
    assert_eq!(dir.names().unwrap(), vec!["paper-1.20.1-123.jar", "paper-1.20.1-124.jar.old"]);
    assert_eq!(dir.read("paper-1.20.1-123.jar").unwrap(), b"build 123");
    assert_eq!(dir.read("paper-1.20.1-124.jar.old").unwrap(), b"build 124");
}

#[tokio::test]
async fn test_interrupted_download_is_finished_by_next_run() {
    let dir = InstallDir::new().unwrap();
    dir.create("paper-1.20.1-123.jar", b"build 123").unwrap();

    let source = MockSource::new(VersionTag::new("1.20.1", 124), b"build 124 payload".to_vec())
        .with_interrupted_download(4);
    let updater = updater(&dir, source.clone());

    let err = updater.update_cycle().await.unwrap_err();
    let typed = find_updater_error(&err).unwrap();
    assert!(matches!(typed, UpdaterError::Transfer { .. }));
    assert!(typed.is_retryable());

    // The partial file stays behind with its manifest; the live jar is untouched
    assert_eq!(
        dir.names().unwrap(),
        vec!["paper-1.20.1-123.jar", "paper-1.20.1-124.jar.new", "paper-1.20.1-124.jar.new.json"]
    );
    assert_eq!(dir.read("paper-1.20.1-123.jar").unwrap(), b"build 123");

    source.heal();
    let outcome = updater.update_cycle().await.unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            artifact: dir.path().join("paper-1.20.1-124.jar"),
            previous: Some(dir.path().join("paper-1.20.1-123.jar")),
            archived_to: Some(dir.path().join("paper-1.20.1-123.jar.old")),
        }
    );
    assert_eq!(dir.names().unwrap(), vec!["paper-1.20.1-123.jar.old", "paper-1.20.1-124.jar"]);
    assert_eq!(dir.read("paper-1.20.1-124.jar").unwrap(), b"build 124 payload");
    assert_eq!(source.download_count(), 2);
}

#[tokio::test]
async fn test_staged_artifact_from_crashed_run_is_promoted_offline() {
    let dir = InstallDir::new().unwrap();
    dir.create("paper-1.20.1-123.jar", b"build 123").unwrap();
    let staged = dir.create("paper-1.20.1-124.jar.new", b"build 124").unwrap();
    StagingManifest::from_download(&DownloadInfo {
        url: "https://fill-data.example.test/paper-1.20.1-124.jar".to_string(),
        file_name: "paper-1.20.1-124.jar".to_string(),
        sha256: None,
        size: Some(9),
    })
    .save(&staged)
    .await
    .unwrap();

    let source = MockSource::unreachable();
    let outcome = updater(&dir, source.clone()).update_cycle().await.unwrap();

    assert!(matches!(outcome, UpdateOutcome::Updated { .. }));
    assert!(source.calls().is_empty(), "recovery must not contact the source");
    assert_eq!(dir.names().unwrap(), vec!["paper-1.20.1-123.jar.old", "paper-1.20.1-124.jar"]);
}

#[tokio::test]
async fn test_repeated_archives_of_same_name_get_numbered_slots() {
    let dir = InstallDir::new().unwrap();
    let first = dir.create("paper-1.20.1-123.jar.old", b"first archive").unwrap();
    dir.set_age(&first, HOUR * 2).unwrap();
    let current = dir.create("paper-1.20.1-123.jar", b"reinstalled 123").unwrap();
    dir.set_age(&current, HOUR).unwrap();

    let source = MockSource::new(VersionTag::new("1.20.1", 124), b"build 124".to_vec());
    updater(&dir, source).update_cycle().await.unwrap();

    assert_eq!(
        dir.names().unwrap(),
        vec!["paper-1.20.1-123.jar.old", "paper-1.20.1-123.jar.old.1", "paper-1.20.1-124.jar"]
    );
    assert_eq!(dir.read("paper-1.20.1-123.jar.old").unwrap(), b"first archive");
    assert_eq!(dir.read("paper-1.20.1-123.jar.old.1").unwrap(), b"reinstalled 123");

    // The numbered slot is the newest archive, so it is the one restored
    let outcome = updater(&dir, MockSource::unreachable()).restore_cycle().await.unwrap();
    assert_eq!(outcome, RestoreOutcome::Restored(dir.path().join("paper-1.20.1-123.jar")));
    assert_eq!(dir.read("paper-1.20.1-123.jar").unwrap(), b"reinstalled 123");
}

#[tokio::test]
async fn test_unreachable_source_changes_nothing() {
    let dir = InstallDir::new().unwrap();
    dir.create("paper-1.20.1-123.jar", b"build 123").unwrap();
    dir.create("paper-1.20.1-122.jar.old", b"build 122").unwrap();
    let before = dir.snapshot().unwrap();

    let err = updater(&dir, MockSource::unreachable()).update_cycle().await.unwrap_err();
    assert!(matches!(find_updater_error(&err), Some(UpdaterError::Discovery { .. })));
    assert_eq!(dir.snapshot().unwrap(), before);
}

#[tokio::test]
async fn test_up_to_date_runs_are_stable() {
    let dir = InstallDir::new().unwrap();
    let source = MockSource::new(VersionTag::new("1.20.1", 124), b"build 124".to_vec());
    let updater = updater(&dir, source.clone());

    updater.update_cycle().await.unwrap();
    let installed = dir.snapshot().unwrap();

    for _ in 0..3 {
        let outcome = updater.update_cycle().await.unwrap();
        assert!(matches!(outcome, UpdateOutcome::UpToDate { .. }));
    }
    assert_eq!(dir.snapshot().unwrap(), installed);
    assert_eq!(source.download_count(), 1);

    let check = updater.check().await.unwrap();
    assert!(!check.update_available);
    assert_eq!(check.local, Some(VersionTag::new("1.20.1", 124)));
}
