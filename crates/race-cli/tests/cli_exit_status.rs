//! Exit status and console contract of the race binaries.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::tempdir;

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(value).expect("json")).expect("write");
    path
}

fn summarize(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_race-summarize"))
        .args(args)
        .env_remove("RACE_METRIC")
        .env_remove("RACE_GROUP_BY")
        .env("RUST_LOG", "error")
        .output()
        .expect("run race-summarize")
}

fn gate(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_race-gate"))
        .args(args)
        .env("RACE_REPO_ROOT", root)
        .env("RUST_LOG", "error")
        .output()
        .expect("run race-gate")
}

fn results() -> Value {
    json!([
        {"simulation": "trolley", "variant": "soft", "seed": 1,
         "results": [{"agent": "a", "composite_score": 40.0}]},
        {"simulation": "trolley", "variant": "soft", "seed": 2,
         "results": [{"agent": "a", "composite_score": 42.4}]}
    ])
}

#[test]
fn summarize_writes_summary_and_confirms() {
    let dir = tempdir().expect("tempdir");
    let input = write_json(dir.path(), "results.json", &results());
    let output = dir.path().join("out/summary.json");

    let out = summarize(&[
        "--results-file",
        input.to_str().expect("utf8"),
        "--group-by",
        "simulation,variant",
        "--output",
        output.to_str().expect("utf8"),
        "--quiet",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(
        stdout.trim(),
        format!("Summary saved to {}", output.display())
    );

    let summary: Value =
        serde_json::from_slice(&std::fs::read(&output).expect("read")).expect("json");
    assert_eq!(summary["rows"][0]["n"], json!(2));
    let mean = summary["rows"][0]["mean"].as_f64().expect("mean");
    assert!((mean - 41.2).abs() < 1e-9);
}

#[test]
fn summarize_fails_on_missing_input_without_output() {
    let dir = tempdir().expect("tempdir");
    let output = dir.path().join("summary.json");
    let out = summarize(&[
        "--results-file",
        dir.path().join("absent.json").to_str().expect("utf8"),
        "--output",
        output.to_str().expect("utf8"),
    ]);
    assert!(!out.status.success());
    assert!(!output.exists());
}

#[test]
fn gate_exit_codes_distinguish_failure_and_fatal() {
    let dir = tempdir().expect("tempdir");
    write_json(
        dir.path(),
        "summary.json",
        &json!({
            "schema_version": "race_summary_v1",
            "group_by": ["simulation", "variant"],
            "records_scanned": 2,
            "records_skipped_missing_metric": 0,
            "rows": [{"group": {"simulation": "trolley", "variant": "soft"},
                      "metric": "auto", "n": 2, "seed_count": 2, "mean": 41.2,
                      "stddev": 1.7, "ci95": 2.36, "min": 40.0, "max": 42.4}]
        }),
    );
    write_json(
        dir.path(),
        "passing.json",
        &json!({"schema_version": "regression_gate_v1",
                "rules": [{"name": "floor", "match": {"simulation": "trolley"}, "min_mean": 40.0}]}),
    );
    write_json(
        dir.path(),
        "failing.json",
        &json!({"schema_version": "regression_gate_v1",
                "rules": [{"name": "floor", "match": {"simulation": "trolley"},
                           "min_mean": 45.0, "max_stddev": 1.0}]}),
    );
    write_json(dir.path(), "empty.json", &json!({"rules": []}));

    let pass = gate(
        dir.path(),
        &["--summary-file", "summary.json", "--baseline-file", "passing.json"],
    );
    assert_eq!(pass.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&pass.stdout).contains("PASS: floor"));

    let fail = gate(
        dir.path(),
        &["--summary-file", "summary.json", "--baseline-file", "failing.json"],
    );
    assert_eq!(fail.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&fail.stdout);
    assert!(stdout.contains("FAIL: floor"));
    assert!(stdout.contains("min_mean"));
    assert!(stdout.contains("1 of 1 rule(s) failed"));

    let fatal = gate(
        dir.path(),
        &["--summary-file", "summary.json", "--baseline-file", "empty.json"],
    );
    assert_eq!(fatal.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&fatal.stdout).is_empty());

    let missing = gate(
        dir.path(),
        &["--summary-file", "nope.json", "--baseline-file", "passing.json"],
    );
    assert_eq!(missing.status.code(), Some(2));
}
