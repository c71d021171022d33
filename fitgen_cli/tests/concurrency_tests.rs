//! Concurrency tests for fitgen.
//!
//! These tests verify that multiple processes can safely:
//! - Append to the progress log simultaneously (file locking)
//! - Read workouts and history while others write

use assert_cmd::Command;
use std::path::Path;
use std::thread;
use tempfile::TempDir;

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fitgen"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn setup_plan(data_dir: &Path) -> Vec<String> {
    cli(data_dir)
        .args(["profile", "set", "--name", "Robin", "--level", "beginner"])
        .assert()
        .success();
    cli(data_dir).arg("generate").assert().success();

    let contents = std::fs::read_to_string(data_dir.join("workouts.json")).unwrap();
    let collection: serde_json::Value = serde_json::from_str(&contents).unwrap();
    collection["workouts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["id"].as_str().unwrap().to_string())
        .collect()
}

fn completed_count(data_dir: &Path) -> usize {
    let contents = std::fs::read_to_string(data_dir.join("workouts.json")).unwrap();
    let collection: serde_json::Value = serde_json::from_str(&contents).unwrap();
    collection["workouts"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|w| w["completed"] == true)
        .count()
}

#[test]
fn test_concurrent_progress_logging() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();
    let ids = setup_plan(&data_dir);

    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                cli(&data_dir)
                    .args(["start", &id, "--auto-complete"])
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    // Every append landed as a whole line
    let log = std::fs::read_to_string(data_dir.join("wal/progress.wal")).unwrap();
    assert_eq!(log.lines().count(), 5);
    for line in log.lines() {
        serde_json::from_str::<serde_json::Value>(line).expect("Torn log line");
    }

    // No completion update was lost to a concurrent writer
    assert_eq!(completed_count(&data_dir), 5);
}

#[test]
fn test_concurrent_reads_during_writes() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();
    let ids = setup_plan(&data_dir);

    let writer = {
        let data_dir = data_dir.clone();
        thread::spawn(move || {
            for id in ids.iter().take(3) {
                cli(&data_dir)
                    .args(["start", id, "--auto-complete"])
                    .assert()
                    .success();
            }
        })
    };

    for _ in 0..3 {
        cli(&data_dir).arg("workouts").assert().success();
        cli(&data_dir).arg("history").assert().success();
    }

    writer.join().expect("Writer panicked");

    let log = std::fs::read_to_string(data_dir.join("wal/progress.wal")).unwrap();
    assert_eq!(log.lines().count(), 3);
    assert_eq!(completed_count(&data_dir), 3);
}

#[test]
fn test_rollup_after_concurrent_logging() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();
    let ids = setup_plan(&data_dir);

    let handles: Vec<_> = ids
        .into_iter()
        .take(2)
        .map(|id| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                cli(&data_dir)
                    .args(["start", &id, "--auto-complete"])
                    .assert()
                    .success();
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    cli(&data_dir).arg("rollup").assert().success();

    // Header plus one row per entry
    let csv_content = std::fs::read_to_string(data_dir.join("progress.csv")).unwrap();
    assert_eq!(csv_content.lines().count(), 3);
}
