//! CLI argument validation tests.
//!
//! Tests command-line argument parsing, validation, and error handling.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::path::Path;

use assert_cmd::Command;
use face_qc_test_support::SyntheticImageBuilder;
use predicates::prelude::*;

fn face_qc(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("face-qc").unwrap();
    cmd.current_dir(dir).env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd
}

// === Missing/Invalid Path Tests ===

#[test]
fn test_missing_path_shows_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    face_qc(temp_dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No paths specified"));
}

#[test]
fn test_check_subcommand_without_path_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    face_qc(temp_dir.path())
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No paths specified"));
}

#[test]
fn test_nonexistent_path_warns_but_continues() {
    let temp_dir = tempfile::tempdir().unwrap();
    face_qc(temp_dir.path())
        .arg("/nonexistent/path/to/image.jpg")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_empty_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    face_qc(temp_dir.path())
        .arg(temp_dir.path())
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_unreadable_image_is_an_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    face_qc(temp_dir.path())
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Skipping").and(predicate::str::contains("broken.png")));
}

// === Value Validation Tests ===

#[test]
fn test_invalid_format_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    face_qc(temp_dir.path())
        .arg("--format")
        .arg("xml")
        .arg("photo.jpg")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_min_score_out_of_range_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    face_qc(temp_dir.path())
        .arg("--min-score")
        .arg("150")
        .arg("photo.jpg")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in 0..=100"));
}

#[test]
fn test_zero_stage_timeout_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("p.png");
    SyntheticImageBuilder::to_dynamic(&SyntheticImageBuilder::portrait(16))
        .save(&path)
        .unwrap();

    face_qc(temp_dir.path())
        .arg("--stage-timeout-ms")
        .arg("0")
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_invalid_landmark_source_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    face_qc(temp_dir.path())
        .arg("--landmarks")
        .arg("camera")
        .arg("photo.jpg")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

// === Help and Version ===

#[test]
fn test_help_lists_commands() {
    let temp_dir = tempfile::tempdir().unwrap();
    face_qc(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("check")
                .and(predicate::str::contains("config"))
                .and(predicate::str::contains("--landmarks")),
        );
}

#[test]
fn test_version() {
    let temp_dir = tempfile::tempdir().unwrap();
    face_qc(temp_dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("face-qc"));
}
