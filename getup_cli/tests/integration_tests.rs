//! Integration tests for the getup binary.
//!
//! These tests verify end-to-end behavior including:
//! - Catalog listing
//! - Replaying recorded frames through a workout
//! - Session persistence and history

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI binary isolated from the user's config file
fn cli(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("getup"));
    cmd.env("XDG_CONFIG_HOME", temp_dir.path().join("config"));
    cmd.arg("--data-dir").arg(temp_dir.path().join("data"));
    cmd
}

fn wal_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("data/wal/workout_sessions.wal")
}

/// Right arm with the elbow bent to `degrees`, torso upright
fn curl_frame(degrees: f64) -> String {
    let rad = degrees.to_radians();
    json!({
        "joints": {
            "right_shoulder": { "x": 0.6, "y": 0.8, "confidence": 0.9 },
            "right_elbow": { "x": 0.6, "y": 0.6, "confidence": 0.9 },
            "right_wrist": {
                "x": 0.6 + 0.15 * rad.sin(),
                "y": 0.6 + 0.15 * rad.cos(),
                "confidence": 0.9
            },
            "right_hip": { "x": 0.6, "y": 0.4, "confidence": 0.9 }
        }
    })
    .to_string()
}

/// Write `reps` full curls (plus the starting frame) as a JSONL recording
fn write_curls(dir: &Path, reps: usize) -> PathBuf {
    let mut lines = vec![curl_frame(170.0)];
    for _ in 0..reps {
        for degrees in [120.0, 70.0, 35.0, 70.0, 120.0, 170.0] {
            lines.push(curl_frame(degrees));
        }
    }
    let path = dir.join(format!("curls_{}.jsonl", reps));
    fs::write(&path, lines.join("\n") + "\n").expect("Failed to write frames");
    path
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Exercise form coaching and rep counting",
        ));
}

#[test]
fn test_exercises_lists_catalog() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .arg("exercises")
        .assert()
        .success()
        .stdout(predicate::str::contains("bicep_curl"))
        .stdout(predicate::str::contains("tree_pose"))
        .stdout(predicate::str::contains("Strength"))
        .stdout(predicate::str::contains("Yoga"));
}

#[test]
fn test_exercises_category_filter() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .arg("exercises")
        .arg("--category")
        .arg("yoga")
        .assert()
        .success()
        .stdout(predicate::str::contains("warrior_two"))
        .stdout(predicate::str::contains("squat").not());
}

#[test]
fn test_replay_logs_completed_workout() {
    let temp_dir = setup_test_dir();
    let frames = write_curls(temp_dir.path(), 3);

    cli(&temp_dir)
        .arg("replay")
        .arg("--exercise")
        .arg("bicep_curl")
        .arg("--frames")
        .arg(&frames)
        .arg("--sets")
        .arg("1")
        .arg("--reps")
        .arg("3")
        .assert()
        .success()
        .stdout(predicate::str::contains("Set 1 · rep 3"))
        .stdout(predicate::str::contains("Workout complete"))
        .stdout(predicate::str::contains("Session logged"));

    let wal_content = fs::read_to_string(wal_path(&temp_dir)).expect("Failed to read WAL");
    assert_eq!(wal_content.lines().count(), 1);
    assert!(wal_content.contains("\"exercise_id\":\"bicep_curl\""));
    assert!(wal_content.contains("\"ended_early\":false"));
}

#[test]
fn test_replay_skip_rest_between_sets() {
    let temp_dir = setup_test_dir();
    let frames = write_curls(temp_dir.path(), 4);

    cli(&temp_dir)
        .arg("replay")
        .arg("--exercise")
        .arg("bicep_curl")
        .arg("--frames")
        .arg(&frames)
        .arg("--sets")
        .arg("2")
        .arg("--reps")
        .arg("2")
        .arg("--rest")
        .arg("30")
        .arg("--skip-rest")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rest skipped, starting set 2"))
        .stdout(predicate::str::contains("Workout complete"));
}

#[test]
fn test_dry_run_does_not_log() {
    let temp_dir = setup_test_dir();
    let frames = write_curls(temp_dir.path(), 2);

    cli(&temp_dir)
        .arg("replay")
        .arg("--exercise")
        .arg("bicep_curl")
        .arg("--frames")
        .arg(&frames)
        .arg("--sets")
        .arg("1")
        .arg("--reps")
        .arg("2")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(!wal_path(&temp_dir).exists());
}

#[test]
fn test_short_recording_saves_partial_workout() {
    let temp_dir = setup_test_dir();
    let frames = write_curls(temp_dir.path(), 2);

    cli(&temp_dir)
        .arg("replay")
        .arg("--exercise")
        .arg("bicep_curl")
        .arg("--frames")
        .arg(&frames)
        .arg("--sets")
        .arg("3")
        .arg("--reps")
        .arg("10")
        .assert()
        .success()
        .stdout(predicate::str::contains("ended before the workout finished"))
        .stdout(predicate::str::contains("0/3 sets · 2 reps"));

    cli(&temp_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("This week: 1 workouts · 2 reps"))
        .stdout(predicate::str::contains("(ended early)"));
}

#[test]
fn test_replay_shows_previous_session() {
    let temp_dir = setup_test_dir();
    let frames = write_curls(temp_dir.path(), 2);
    let replay = |temp_dir: &TempDir| {
        let mut cmd = cli(temp_dir);
        cmd.arg("replay")
            .arg("--exercise")
            .arg("bicep_curl")
            .arg("--frames")
            .arg(&frames)
            .arg("--sets")
            .arg("1")
            .arg("--reps")
            .arg("2");
        cmd
    };

    replay(&temp_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Last time").not());

    replay(&temp_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Last time ("))
        .stdout(predicate::str::contains("1/1 sets · 2 reps"));
}

#[test]
fn test_history_rejects_out_of_range_window() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .arg("history")
        .arg("--days")
        .arg("9223372036854775807")
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_history_empty() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .arg("history")
        .arg("--days")
        .arg("3")
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts in the last 3 days"));
}

#[test]
fn test_replay_unknown_exercise_fails() {
    let temp_dir = setup_test_dir();
    let frames = write_curls(temp_dir.path(), 1);

    cli(&temp_dir)
        .arg("replay")
        .arg("--exercise")
        .arg("moonwalk")
        .arg("--frames")
        .arg(&frames)
        .assert()
        .failure()
        .stderr(predicate::str::contains("moonwalk"));

    assert!(!wal_path(&temp_dir).exists());
}

#[test]
fn test_replay_skips_garbage_lines() {
    let temp_dir = setup_test_dir();
    let frames = write_curls(temp_dir.path(), 1);
    let mut content = fs::read_to_string(&frames).unwrap();
    content.insert_str(0, "not json\n\n");
    fs::write(&frames, content).unwrap();

    cli(&temp_dir)
        .arg("replay")
        .arg("--exercise")
        .arg("bicep_curl")
        .arg("--frames")
        .arg(&frames)
        .arg("--sets")
        .arg("1")
        .arg("--reps")
        .arg("1")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout complete"));
}
