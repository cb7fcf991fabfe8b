//! Gate verdicts over summary documents.

use race_core::{
    flatten_records, read_json_document, render_gate_report, run_gate, summarize,
    write_gate_report_json, write_summary_json, BaselineDocument, GateReportArtifact,
    LoadedSummary, MetricSpec, RunRecord, SummarizeConfig, EXIT_PASSED, EXIT_RULES_FAILED,
};
use serde_json::{json, Value};
use tempfile::tempdir;

fn summary_with_mean(mean: f64) -> LoadedSummary {
    LoadedSummary::from_value(&json!({
        "schema_version": "race_summary_v1",
        "group_by": ["simulation", "variant"],
        "records_scanned": 3,
        "records_skipped_missing_metric": 0,
        "rows": [
            {"group": {"simulation": "trolley", "variant": "soft_guidelines"},
             "metric": "composite_score", "n": 3, "seed_count": 3,
             "mean": mean, "stddev": 4.0, "ci95": 4.53, "min": 37.0, "max": 45.0}
        ]
    }))
    .expect("summary")
}

fn baseline(value: Value) -> BaselineDocument {
    BaselineDocument::from_value(&value).expect("baseline")
}

#[test]
fn min_mean_regression_fails_once() {
    let report = run_gate(
        &summary_with_mean(41.2),
        &baseline(json!({
            "schema_version": "regression_gate_v1",
            "metric": "composite_score",
            "rules": [{
                "name": "trolley-soft",
                "match": {"simulation": "trolley", "variant": "soft_guidelines"},
                "min_mean": 45.0,
                "max_stddev": 1.0,
                "min_runs": 5
            }]
        })),
    );

    assert_eq!(report.total_failures(), 1);
    assert_eq!(report.exit_code(), EXIT_RULES_FAILED);

    let rendered = render_gate_report(&report);
    assert!(rendered.contains("FAIL: trolley-soft"));
    assert!(rendered.contains("min_mean"));
    assert!(rendered.contains("max_stddev"));
    assert!(rendered.contains("min_runs"));
    assert!(rendered.ends_with("Regression gate failed: 1 of 1 rule(s) failed\n"));
}

#[test]
fn healthy_summary_passes() {
    let report = run_gate(
        &summary_with_mean(46.0),
        &baseline(json!({
            "schema_version": "regression_gate_v1",
            "rules": [{
                "match": {"simulation": "trolley"},
                "metric": "composite_score",
                "min_mean": 45.0,
                "min_seed_count": 3,
                "max_ci95": 5.0,
                "require_ci95": true
            }]
        })),
    );

    assert!(report.passed());
    assert_eq!(report.exit_code(), EXIT_PASSED);
    let rendered = render_gate_report(&report);
    assert!(rendered.starts_with("PASS: {\"simulation\": \"trolley\"}\n"));
}

#[test]
fn summarize_then_gate_round_trip_through_files() {
    let records = vec![
        RunRecord::new("trolley", "hard_rules", 1)
            .with_result(json!({"agent": "utilitarian", "composite_score": 40.0})),
        RunRecord::new("trolley", "hard_rules", 2)
            .with_result(json!({"agent": "utilitarian", "composite_score": 50.0})),
        RunRecord::new("trolley", "unconstrained", 1)
            .with_result(json!({"agent": "utilitarian", "composite_score": 30.0})),
    ];
    let config = SummarizeConfig::new(
        MetricSpec::parse("composite_score").expect("metric"),
        vec!["simulation".to_string(), "variant".to_string()],
    )
    .expect("config");
    let document = summarize(&flatten_records(&records), &config)
        .expect("summarize")
        .document;

    let dir = tempdir().expect("tempdir");
    let summary_path = dir.path().join("summary.json");
    write_summary_json(&summary_path, &document).expect("write summary");

    let baseline_path = dir.path().join("baseline.json");
    std::fs::write(
        &baseline_path,
        serde_json::to_vec(&json!({
            "schema_version": "regression_gate_v1",
            "metric": "composite_score",
            "rules": [
                {"name": "hard-rules-floor", "match": {"variant": "hard_rules"},
                 "min_mean": 44.0, "max_ci95": 10.0, "min_seed_count": 2},
                {"name": "unconstrained-ci", "match": {"variant": "unconstrained"},
                 "max_ci95": 10.0},
                {"name": "all-trolley", "match": {"simulation": "trolley"}}
            ]
        }))
        .expect("json"),
    )
    .expect("write baseline");

    let summary_doc = read_json_document(&summary_path).expect("read summary");
    let baseline_doc = read_json_document(&baseline_path).expect("read baseline");
    let summary = LoadedSummary::from_value(&summary_doc.value).expect("summary");
    let baseline = BaselineDocument::from_value(&baseline_doc.value).expect("baseline");

    let report = run_gate(&summary, &baseline);
    assert!(report.outcomes[0].passed, "{:?}", report.outcomes[0]);

    // n=1 has no ci95: reported as missing, not out of bound.
    let unconstrained = &report.outcomes[1];
    assert!(!unconstrained.passed);
    assert_eq!(
        unconstrained.row_failures[0].failures,
        vec!["ci95 missing for max_ci95=10.0".to_string()]
    );

    let all = &report.outcomes[2];
    assert!(!all.passed);
    assert!(all.reason.as_deref().unwrap_or_default().contains("ambiguous"));
    assert_eq!(report.total_failures(), 2);

    let report_path = dir.path().join("gate_report.json");
    let artifact = GateReportArtifact::new(&report, &summary_doc.digest, &baseline_doc.digest);
    write_gate_report_json(&report_path, &artifact).expect("write report");
    let raw: Value =
        serde_json::from_slice(&std::fs::read(&report_path).expect("read")).expect("json");
    assert_eq!(raw["schema_version"], json!("regression_gate_report_v1"));
    assert_eq!(raw["total_failures"], json!(2));
    assert_eq!(raw["summary_digest"], json!(summary_doc.digest));

    let again = run_gate(&summary, &baseline);
    assert_eq!(again, report);
}

#[test]
fn numerically_equal_group_values_gate_as_one_row() {
    let records = vec![
        RunRecord::new("auction", "soft", 1)
            .with_result(json!({"agent": "a", "tier": 1, "composite_score": 40.0})),
        RunRecord::new("auction", "soft", 2)
            .with_result(json!({"agent": "a", "tier": 1.0, "composite_score": 50.0})),
    ];
    let config = SummarizeConfig::new(
        MetricSpec::parse("auto").expect("metric"),
        vec!["simulation".to_string(), "tier".to_string()],
    )
    .expect("config");
    let document = summarize(&flatten_records(&records), &config)
        .expect("summarize")
        .document;
    assert_eq!(document.rows.len(), 1);

    let summary =
        LoadedSummary::from_value(&serde_json::to_value(&document).expect("json")).expect("summary");
    let report = run_gate(
        &summary,
        &baseline(json!({"rules": [{"match": {"tier": 1}, "min_runs": 2}]})),
    );
    assert!(report.passed(), "{}", render_gate_report(&report));
}
