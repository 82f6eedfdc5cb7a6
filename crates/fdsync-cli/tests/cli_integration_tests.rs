//! CLI integration tests
//!
//! Drive the `fdsync` binary against a temporary database. Network
//! collaborators point at a closed local port so no test leaves the host.

use fdsync_core::Snapshot;
use fdsync_store::cache::{SnapshotCache, SqliteSnapshotCache};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn setup_test_db(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("fdsync.db")
}

fn fdsync(dir: &Path, db_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fdsync"))
        .current_dir(dir)
        .env("FDSYNC_DATABASE_PATH", db_path)
        .env("FDSYNC_LOG_PROFILE", "test")
        .env("FDSYNC_FEED_BASE_URL", "http://127.0.0.1:1")
        .env("FDSYNC_EXTRACTOR_URL", "http://127.0.0.1:1/extract")
        .env("FDSYNC_HTTP_TIMEOUT_SECS", "2")
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

#[test]
fn test_cli_migrate_lists_applied_migrations() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = setup_test_db(&temp_dir);

    let output = fdsync(temp_dir.path(), &db_path, &["migrate"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("001_initial_schema"));
    assert!(stdout.contains("003_run_ledger"));
    assert!(db_path.exists());
}

#[test]
fn test_cli_cache_show_and_clear() {
    // Given: A stored baseline
    let temp_dir = TempDir::new().unwrap();
    let db_path = setup_test_db(&temp_dir);
    let snapshot = Snapshot::from("Hon. Smith John 01/02/2024 20240001234\n");
    SqliteSnapshotCache::open(&db_path, "old")
        .unwrap()
        .commit(&snapshot)
        .unwrap();

    // When: It is shown
    let output = fdsync(temp_dir.path(), &db_path, &["cache", "show"]);

    // Then: Its size and digest are printed
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lines: 1"));
    assert!(stdout.contains(&snapshot.digest()));

    // When: It is cleared
    let output = fdsync(temp_dir.path(), &db_path, &["cache", "clear"]);
    assert!(output.status.success());

    // Then: Nothing is stored any more
    let output = fdsync(temp_dir.path(), &db_path, &["cache", "show"]);
    assert!(String::from_utf8_lossy(&output.stdout).contains("No baseline stored"));
}

#[test]
fn test_cli_run_with_unreachable_feed_fails_and_is_recorded() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = setup_test_db(&temp_dir);

    let output = fdsync(temp_dir.path(), &db_path, &["run", "--period", "2024"]);

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERR_FETCH_FAILED"), "stderr: {}", stderr);

    let output = fdsync(temp_dir.path(), &db_path, &["runs"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("failed"));
    assert!(stdout.contains("period=2024"));
    assert!(stdout.contains("error=ERR_FETCH_FAILED"));
}

#[test]
fn test_cli_rejects_malformed_period() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = setup_test_db(&temp_dir);

    let output = fdsync(temp_dir.path(), &db_path, &["run", "--period", "24"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("four-digit"));
}

#[test]
fn test_cli_reports_configuration_errors() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = setup_test_db(&temp_dir);

    let output = Command::new(env!("CARGO_BIN_EXE_fdsync"))
        .current_dir(temp_dir.path())
        .env("FDSYNC_DATABASE_PATH", &db_path)
        .env("FDSYNC_LOG_PROFILE", "test")
        .env("FDSYNC_CACHE_BACKEND", "redis")
        .env_remove("FDSYNC_REDIS_URL")
        .args(["cache", "show"])
        .output()
        .expect("Failed to execute CLI");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("redis_url"));
}
