//! Integration tests for the dojo binary.
//!
//! These tests verify end-to-end behavior including:
//! - Seeding and listing workout plans
//! - Session lifecycle through the command surface
//! - Persistence across invocations (separate processes)
//! - CSV export

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("dojo"))
}

/// Run `dojo workouts` and return the id of the first listed plan
fn first_workout_id(data_dir: &Path) -> String {
    let output = cli()
        .arg("workouts")
        .arg("--data-dir")
        .arg(data_dir)
        .output()
        .expect("Failed to list workouts");
    let stdout = String::from_utf8(output.stdout).expect("Invalid utf8");
    let first_line = stdout.lines().next().expect("No workouts listed");
    first_line
        .split_whitespace()
        .next()
        .expect("Missing workout id")
        .to_string()
}

/// Seed plans and start a session, returning the session id
fn start_session(data_dir: &Path) -> String {
    cli()
        .arg("seed")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    let workout_id = first_workout_id(data_dir);
    let output = cli()
        .arg("start")
        .arg(&workout_id)
        .arg("--data-dir")
        .arg(data_dir)
        .output()
        .expect("Failed to start session");
    let stdout = String::from_utf8(output.stdout).expect("Invalid utf8");
    let line = stdout
        .lines()
        .find(|l| l.starts_with("Started session"))
        .expect("Missing start confirmation");
    line.split_whitespace()
        .last()
        .expect("Missing session id")
        .to_string()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Event-sourced training session engine",
        ));
}

#[test]
fn test_seed_installs_three_plans() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("seed")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("3 workout plans"));

    cli()
        .arg("workouts")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("30-Minute Session"))
        .stdout(predicate::str::contains("90-Minute Session"));
}

#[test]
fn test_seed_twice_does_not_duplicate() {
    let temp_dir = setup_test_dir();

    for _ in 0..2 {
        cli()
            .arg("seed")
            .arg("--data-dir")
            .arg(temp_dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("3 workout plans"));
    }
}

#[test]
fn test_start_with_unknown_workout_fails() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("start")
        .arg("00000000-0000-0000-0000-000000000000")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure();
}

#[test]
fn test_start_then_status_shows_running_session() {
    let temp_dir = setup_test_dir();
    let session_id = start_session(temp_dir.path());

    cli()
        .arg("status")
        .arg(&session_id)
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("running"))
        .stdout(predicate::str::contains("warmup"));
}

#[test]
fn test_tick_counts_down_across_processes() {
    let temp_dir = setup_test_dir();
    let session_id = start_session(temp_dir.path());

    // The seeded 30-minute plan opens with a 120s warmup round
    cli()
        .arg("tick")
        .arg(&session_id)
        .arg("--count")
        .arg("5")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Time left: 115s"));

    // A separate invocation picks up where the last one saved
    cli()
        .arg("tick")
        .arg(&session_id)
        .arg("--count")
        .arg("5")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Time left: 110s"));
}

#[test]
fn test_pause_blocks_ticking() {
    let temp_dir = setup_test_dir();
    let session_id = start_session(temp_dir.path());

    cli()
        .arg("pause")
        .arg(&session_id)
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("paused"));

    // Ticking a paused session is a policy no-op
    cli()
        .arg("tick")
        .arg(&session_id)
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Time left: 120s"));

    cli()
        .arg("resume")
        .arg(&session_id)
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("running"));
}

#[test]
fn test_skip_block_moves_to_next_block() {
    let temp_dir = setup_test_dir();
    let session_id = start_session(temp_dir.path());

    cli()
        .arg("skip-block")
        .arg(&session_id)
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Block:    2/6"))
        .stdout(predicate::str::contains("jump_rope"));
}

#[test]
fn test_status_of_unknown_session_fails() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("status")
        .arg("00000000-0000-0000-0000-000000000000")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure();
}

#[test]
fn test_export_writes_csv() {
    let temp_dir = setup_test_dir();
    start_session(temp_dir.path());

    let csv_path = temp_dir.path().join("out.csv");
    cli()
        .arg("export")
        .arg("--out")
        .arg(&csv_path)
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 sessions"));

    let contents = std::fs::read_to_string(&csv_path).expect("Failed to read CSV");
    assert!(contents.starts_with("session_id"));
    assert!(contents.contains("running"));
}

#[test]
fn test_event_stream_persisted_per_session() {
    let temp_dir = setup_test_dir();
    let session_id = start_session(temp_dir.path());

    cli()
        .arg("tick")
        .arg(&session_id)
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    // One append-only JSONL stream per session id
    let stream_path = temp_dir
        .path()
        .join("events")
        .join(format!("{}.jsonl", session_id));
    let contents = std::fs::read_to_string(&stream_path).expect("Failed to read stream");

    let mut types = Vec::new();
    for line in contents.lines() {
        let record: serde_json::Value = serde_json::from_str(line).expect("Invalid record");
        types.push(record["event_type"].as_str().unwrap_or_default().to_string());
    }
    assert_eq!(
        &types[..3],
        &["SessionStarted", "BlockStarted", "RoundStarted"]
    );
    assert!(types.contains(&"SessionTicked".to_string()));
}
