//! End-to-end CLI checks against the simulated sensor backend.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn ranger() -> Command {
    Command::cargo_bin("ranger_cli").expect("binary built")
}

#[test]
fn no_arguments_prints_usage() {
    ranger()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn self_check_passes_on_the_simulator() {
    ranger()
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("self-check ok"));
}

#[test]
fn self_check_json_reports_readings() {
    let out = ranger()
        .args(["--json", "self-check"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let line = String::from_utf8(out).unwrap();
    let v: serde_json::Value =
        serde_json::from_str(line.lines().last().unwrap()).expect("last line is JSON");
    assert_eq!(v["ok"], true);
    assert!(v["readings"].as_u64().unwrap() >= 1);
}

#[test]
fn scan_terminates_on_its_own_deadline() {
    ranger()
        .args(["scan", "--duration-ms", "300"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scan finished"));
}

#[test]
fn scan_stops_after_max_readings() {
    ranger()
        .args(["scan", "--max-readings", "5", "--duration-ms", "5000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scan finished"));
}

#[rstest]
#[case(2, true)]
#[case(3, false)]
fn measure_reports_derived_metrics(#[case] points: usize, #[case] volume_is_null: bool) {
    let out = ranger()
        .args([
            "--json",
            "measure",
            "--points",
            &points.to_string(),
            "--interval-ms",
            "50",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    let v: serde_json::Value =
        serde_json::from_str(text.lines().last().unwrap()).expect("last line is JSON");
    assert_eq!(v["points_mm"].as_array().unwrap().len(), points);
    assert!(
        v["area_m2"].as_f64().unwrap() > 0.0,
        "two or more simulated points always yield a positive area"
    );
    assert_eq!(v["volume_m3"].is_null(), volume_is_null);
}

#[test]
fn invalid_config_is_rejected_with_a_hint() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("ranger.toml");
    fs::write(
        &cfg,
        r#"
[filter]
smoothing_window = 0
"#,
    )
    .unwrap();

    ranger()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("smoothing_window"));
}

#[test]
fn custom_config_drives_the_pipeline() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("ranger.toml");
    fs::write(
        &cfg,
        r#"
[filter]
smoothing_window = 2

[stability]
threshold = 1

[watchdog]
poll_ms = 50
stale_after_ms = 200
"#,
    )
    .unwrap();

    ranger()
        .arg("--config")
        .arg(&cfg)
        .args(["scan", "--duration-ms", "250"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scan finished"));
}
