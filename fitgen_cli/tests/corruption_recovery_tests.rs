//! Corruption recovery tests for fitgen.
//!
//! These tests verify the CLI keeps working with:
//! - Corrupted workout and profile files
//! - Corrupted or partially written progress logs
//! - Bad rows in the archived CSV

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
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

fn create_profile(data_dir: &Path) {
    cli(data_dir)
        .args(["profile", "set", "--name", "Robin", "--level", "beginner"])
        .assert()
        .success();
}

#[test]
fn test_corrupted_workouts_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("workouts.json"), "{ invalid json }}}}").unwrap();

    cli(data_dir)
        .arg("workouts")
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts yet"));

    // Generating replaces the unreadable collection
    create_profile(data_dir);
    cli(data_dir)
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated 5 workouts"));

    let contents = fs::read_to_string(data_dir.join("workouts.json")).unwrap();
    let collection: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(collection["workouts"].as_array().unwrap().len(), 5);
}

#[test]
fn test_corrupted_profile_counts_as_missing() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("profile.json"), "not a profile").unwrap();

    cli(data_dir)
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No profile found"));
}

#[test]
fn test_corrupted_log_lines_skipped() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::create_dir_all(data_dir.join("wal")).unwrap();
    fs::write(
        data_dir.join("wal/progress.wal"),
        "{ invalid json }\n{ more invalid }\n",
    )
    .unwrap();

    cli(data_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts recorded yet"));

    cli(data_dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workouts completed: 0"));
}

#[test]
fn test_partial_log_line() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::create_dir_all(data_dir.join("wal")).unwrap();
    let mut file = fs::File::create(data_dir.join("wal/progress.wal")).unwrap();
    writeln!(
        file,
        r#"{{"id":"00000000-0000-0000-0000-000000000001","date":"2026-01-05T10:00:00Z","workout_id":"00000000-0000-0000-0000-000000000002","workout_name":"Cardio Workout 2","completed":true}}"#
    )
    .unwrap();
    // Crash mid-write
    write!(file, r#"{{"id":"00000000-0000-0000-0000-0000"#).unwrap();
    drop(file);

    cli(data_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cardio Workout 2"));

    cli(data_dir)
        .arg("rollup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 1 entries"));
}

#[test]
fn test_bad_csv_rows_skipped() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(
        data_dir.join("progress.csv"),
        "id,date,workout_id,workout_name,completed,rating,notes,exercise_time_spent,total_seconds\n\
         not-a-uuid,yesterday,x,Broken,true,,,{},0\n\
         00000000-0000-0000-0000-000000000003,2026-01-04T09:00:00+00:00,00000000-0000-0000-0000-000000000004,Strength Workout 1,true,5,,{},0\n",
    )
    .unwrap();

    cli(data_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Strength Workout 1"))
        .stdout(predicate::str::contains("Broken").not());
}

#[test]
fn test_missing_data_dir_is_created() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("nested/data");

    cli(&data_dir)
        .args(["profile", "set", "--name", "Robin", "--level", "advanced"])
        .assert()
        .success();

    assert!(data_dir.join("profile.json").exists());
}
