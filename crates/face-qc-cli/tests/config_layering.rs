//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: defaults < XDG config < project config <
//! `--config` file < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use face_qc_test_support::SyntheticImageBuilder;
use predicates::prelude::*;

fn face_qc(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("face-qc").unwrap();
    cmd.current_dir(dir).env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd
}

/// Writes a small dark photo that the quality stage rejects quickly.
fn dark_photo(dir: &Path) -> PathBuf {
    let path = dir.join("dark.png");
    SyntheticImageBuilder::to_dynamic(&SyntheticImageBuilder::underexposed(32, 32))
        .save(&path)
        .unwrap();
    path
}

fn write_xdg(dir: &Path, content: &str) {
    let xdg = dir.join("xdg/face-qc");
    fs::create_dir_all(&xdg).unwrap();
    fs::write(xdg.join("config.toml"), content).unwrap();
}

#[test]
fn test_project_config_applies_format() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join(".face-qc.toml"), "[output]\nformat = 'json'\n").unwrap();
    let photo = dark_photo(temp_dir.path());

    face_qc(temp_dir.path())
        .arg(&photo)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_cli_overrides_project_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join(".face-qc.toml"), "[output]\nformat = 'json'\n").unwrap();
    let photo = dark_photo(temp_dir.path());

    face_qc(temp_dir.path())
        .arg("--format")
        .arg("jsonl")
        .arg(&photo)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_project_config_found_in_parent() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join(".face-qc.toml"), "[output]\nformat = 'json'\n").unwrap();
    let nested = temp_dir.path().join("a/b");
    fs::create_dir_all(&nested).unwrap();
    let photo = dark_photo(temp_dir.path());

    face_qc(temp_dir.path())
        .current_dir(&nested)
        .arg(&photo)
        .assert()
        .stdout(predicate::str::starts_with("["));
}

#[cfg(target_os = "linux")]
#[test]
fn test_xdg_config_applies() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_xdg(temp_dir.path(), "[output]\nformat = 'json'\n");
    let photo = dark_photo(temp_dir.path());

    face_qc(temp_dir.path())
        .arg(&photo)
        .assert()
        .stdout(predicate::str::starts_with("["));
}

#[cfg(target_os = "linux")]
#[test]
fn test_project_overrides_xdg_key_by_key() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_xdg(
        temp_dir.path(),
        "[orchestrator]\nmin_overall_score = 70.0\nskip_awb = true\n",
    );
    fs::write(
        temp_dir.path().join(".face-qc.toml"),
        "[orchestrator]\nmin_overall_score = 80.0\n",
    )
    .unwrap();

    face_qc(temp_dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("min_overall_score = 80.0")
                .and(predicate::str::contains("skip_awb = true")),
        );
}

#[test]
fn test_explicit_config_overrides_project() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join(".face-qc.toml"), "[output]\nformat = 'json'\n").unwrap();
    let explicit = temp_dir.path().join("ci.toml");
    fs::write(&explicit, "[output]\nformat = 'jsonl'\n").unwrap();
    let photo = dark_photo(temp_dir.path());

    face_qc(temp_dir.path())
        .arg("--config")
        .arg(&explicit)
        .arg(&photo)
        .assert()
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_config_can_relax_quality_gate() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join(".face-qc.toml"),
        "[orchestrator]\ncontinue_on_quality_failure = true\n",
    )
    .unwrap();
    let photo = dark_photo(temp_dir.path());

    let output = face_qc(temp_dir.path()).arg(&photo).output().unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(parsed["pipeline"]["stage"], "complete");
    assert_eq!(parsed["pipeline"]["rejection_reason"], "quality_rejected");
    assert!(parsed["pipeline"]["lighting"].is_object());
}

#[test]
fn test_invalid_toml_is_an_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join(".face-qc.toml"), "[output\nformat = 'json'\n").unwrap();
    let photo = dark_photo(temp_dir.path());

    face_qc(temp_dir.path())
        .arg(&photo)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_invalid_value_is_an_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join(".face-qc.toml"),
        "[lighting.weights]\ncct = 0.0\nuniformity = 0.0\nshadow = 0.0\n",
    )
    .unwrap();

    face_qc(temp_dir.path())
        .args(["config", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    face_qc(temp_dir.path())
        .args(["config", "show", "--config", "nope.toml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_config_show_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    face_qc(temp_dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[orchestrator]")
                .and(predicate::str::contains("min_overall_score = 60.0"))
                .and(predicate::str::contains("[awb]")),
        );
}

#[test]
fn test_config_paths_lists_layers() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join(".face-qc.toml"), "").unwrap();

    face_qc(temp_dir.path())
        .args(["config", "paths"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".face-qc.toml"));
}
