//! Tests for the `paperup` binary: modes, output and exit codes.

use assert_cmd::Command;
use paperup_cli::test_utils::{InstallDir, StubServer};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const HELLO_SHA256: &str = "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f";

const VERSIONS_BODY: &str = r#"{
    "project": {"id": "paper", "name": "Paper"},
    "versions": [
        {"version": {"id": "1.21.4"}, "builds": [232, 231]},
        {"version": {"id": "1.21.3"}, "builds": [83]}
    ]
}"#;

/// `paperup` isolated from the caller's environment and config file.
fn paperup(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("paperup").unwrap();
    cmd.env_remove("PAPER_DIR")
        .env_remove("RUST_LOG")
        .env("PAPERUP_CONFIG_PATH", home.path().join("missing.toml"))
        .env("NO_COLOR", "1")
        .arg("--no-progress");
    cmd
}

/// Stub Fill API announcing 1.21.4 build 232 with "Hello, World!" as the jar.
fn fill_server() -> StubServer {
    let server = StubServer::start().unwrap();
    let build_body = format!(
        r#"{{
            "id": 232,
            "channel": "STABLE",
            "downloads": {{
                "server:default": {{
                    "name": "paper-1.21.4-232.jar",
                    "checksums": {{"sha256": "{HELLO_SHA256}"}},
                    "size": 13,
                    "url": "{}"
                }}
            }}
        }}"#,
        server.url("/objects/paper-1.21.4-232.jar")
    );

    server
        .route("/projects/paper/versions", 200, VERSIONS_BODY)
        .route("/projects/paper/versions/1.21.4/builds/232", 200, build_body)
        .route("/objects/paper-1.21.4-232.jar", 200, "Hello, World!")
}

fn write_config(home: &TempDir, api_base_url: &str) -> PathBuf {
    let path = home.path().join("config.toml");
    std::fs::write(
        &path,
        format!("[updater]\napi_base_url = \"{api_base_url}\"\ntimeout_secs = 5\n"),
    )
    .unwrap();
    path
}

fn dir_arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn test_missing_directory_exits_2() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("no-such-server");

    paperup(&home)
        .args(["--dir", &dir_arg(&missing)])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Directory does not exist"));
}

#[test]
fn test_restore_with_nothing_archived_succeeds() {
    let home = TempDir::new().unwrap();
    let dir = InstallDir::new().unwrap();
    dir.create("paper-1.21.4-231.jar", b"live").unwrap();

    paperup(&home)
        .args(["--dir", &dir_arg(dir.path()), "--restore"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No archived jars to restore"));

    assert_eq!(dir.names().unwrap(), vec!["paper-1.21.4-231.jar"]);
}

#[test]
fn test_restore_newest_archive() {
    let home = TempDir::new().unwrap();
    let dir = InstallDir::new().unwrap();
    let older = dir.create("paper-1.21.4-229.jar.old", b"229").unwrap();
    dir.set_age(&older, Duration::from_secs(7200)).unwrap();
    let newer = dir.create("paper-1.21.4-230.jar.old", b"230").unwrap();
    dir.set_age(&newer, Duration::from_secs(3600)).unwrap();

    paperup(&home)
        .args(["-r", "--dir", &dir_arg(dir.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored paper-1.21.4-230.jar"));

    assert_eq!(dir.names().unwrap(), vec!["paper-1.21.4-229.jar.old", "paper-1.21.4-230.jar"]);
    assert_eq!(dir.read("paper-1.21.4-230.jar").unwrap(), b"230");
}

#[test]
fn test_list_backups_uses_paper_dir_env() {
    let home = TempDir::new().unwrap();
    let dir = InstallDir::new().unwrap();
    dir.create("paper-1.21.4-230.jar.old", b"230").unwrap();
    dir.create("paper-1.21.4-230.jar.old.1", b"230 again").unwrap();
    dir.create("notes.txt.old", b"not a jar").unwrap();

    paperup(&home)
        .env("PAPER_DIR", dir.path())
        .arg("--list-backups")
        .assert()
        .success()
        .stdout(predicate::str::contains("paper-1.21.4-230.jar.old"))
        .stdout(predicate::str::contains("paper-1.21.4-230.jar.old.1"))
        .stdout(predicate::str::contains("1.21.4-230"))
        .stdout(predicate::str::contains("notes.txt.old").not());
}

#[test]
fn test_conflicting_modes_are_rejected() {
    let home = TempDir::new().unwrap();
    paperup(&home).args(["--restore", "--check"]).assert().failure();
}

#[test]
fn test_check_reports_versions_without_changes() {
    let home = TempDir::new().unwrap();
    let server = fill_server();
    let config = write_config(&home, &server.url(""));
    let dir = InstallDir::new().unwrap();
    dir.create("paper-1.21.4-231.jar", b"live").unwrap();
    let before = dir.snapshot().unwrap();

    paperup(&home)
        .args(["--dir", &dir_arg(dir.path()), "--check", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed: 1.21.4-231"))
        .stdout(predicate::str::contains("Latest:    1.21.4-232"))
        .stdout(predicate::str::contains("Update available"));

    assert_eq!(dir.snapshot().unwrap(), before);
}

#[test]
fn test_update_downloads_and_archives() {
    let home = TempDir::new().unwrap();
    let server = fill_server();
    let config = write_config(&home, &server.url(""));
    let dir = InstallDir::new().unwrap();
    dir.create("paper-1.21.4-231.jar", b"live").unwrap();

    paperup(&home)
        .args(["--dir", &dir_arg(dir.path()), "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed paper-1.21.4-232.jar"))
        .stdout(predicate::str::contains("paper-1.21.4-231.jar.old"));

    assert_eq!(dir.names().unwrap(), vec!["paper-1.21.4-231.jar.old", "paper-1.21.4-232.jar"]);
    assert_eq!(dir.read("paper-1.21.4-232.jar").unwrap(), b"Hello, World!");

    // Second run is a no-op
    paperup(&home)
        .args(["--dir", &dir_arg(dir.path()), "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("is up to date"));
    assert_eq!(dir.names().unwrap(), vec!["paper-1.21.4-231.jar.old", "paper-1.21.4-232.jar"]);
}

#[test]
fn test_remote_failure_exits_0_and_changes_nothing() {
    let home = TempDir::new().unwrap();
    let server = StubServer::start().unwrap().route("/projects/paper/versions", 503, "busy");
    let config = write_config(&home, &server.url(""));
    let dir = InstallDir::new().unwrap();
    dir.create("paper-1.21.4-231.jar", b"live").unwrap();
    let before = dir.snapshot().unwrap();

    paperup(&home)
        .args(["--dir", &dir_arg(dir.path()), "--config"])
        .arg(&config)
        .assert()
        .code(0)
        .stderr(predicate::str::contains("HTTP 503"))
        .stderr(predicate::str::contains("the next run will retry"));

    assert_eq!(dir.snapshot().unwrap(), before);
}

#[test]
fn test_ambiguous_directory_exits_1() {
    let home = TempDir::new().unwrap();
    let server = fill_server();
    let config = write_config(&home, &server.url(""));
    let dir = InstallDir::new().unwrap();
    dir.create("paper-1.21.4-230.jar", b"a").unwrap();
    dir.create("paper-1.21.4-231.jar", b"b").unwrap();
    let before = dir.snapshot().unwrap();

    paperup(&home)
        .args(["--dir", &dir_arg(dir.path()), "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("candidate server artifacts"));

    assert_eq!(dir.snapshot().unwrap(), before);
}

#[test]
fn test_explicit_missing_config_is_an_error() {
    let home = TempDir::new().unwrap();
    let dir = InstallDir::new().unwrap();

    paperup(&home)
        .args(["--dir", &dir_arg(dir.path()), "--config"])
        .arg(home.path().join("absent.toml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}
