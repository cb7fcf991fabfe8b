use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::domain::{canonical_json, Result, SummaryRow};
use crate::files::write_json_atomic;
use crate::gate::{GateReport, RuleOutcome};

/// Schema tag of the persisted gate report.
pub const GATE_REPORT_SCHEMA_VERSION: &str = "regression_gate_report_v1";

/// SHA-256 hex digest of raw bytes.
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Gate report artifact written for CI consumption.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateReportArtifact {
    pub schema_version: String,
    pub evaluated_at: DateTime<Utc>,
    pub summary_digest: String,
    pub baseline_digest: String,
    pub total_rules: usize,
    pub total_failures: usize,
    pub passed: bool,
    pub rules: Vec<RuleOutcome>,
}

impl GateReportArtifact {
    pub fn new(report: &GateReport, summary_digest: &str, baseline_digest: &str) -> Self {
        Self {
            schema_version: GATE_REPORT_SCHEMA_VERSION.to_string(),
            evaluated_at: Utc::now(),
            summary_digest: summary_digest.to_string(),
            baseline_digest: baseline_digest.to_string(),
            total_rules: report.total_rules(),
            total_failures: report.total_failures(),
            passed: report.passed(),
            rules: report.outcomes.clone(),
        }
    }
}

/// Write the gate report artifact in pretty JSON format.
pub fn write_gate_report_json(path: &Path, artifact: &GateReportArtifact) -> Result<()> {
    write_json_atomic(path, artifact)
}

/// Render the console report: one PASS/FAIL line per rule, indented details
/// under failing rules, and a closing summary line.
pub fn render_gate_report(report: &GateReport) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        if outcome.passed {
            out.push_str(&format!("PASS: {}\n", outcome.name));
            continue;
        }

        out.push_str(&format!("FAIL: {}\n", outcome.name));
        if let Some(reason) = &outcome.reason {
            out.push_str(&format!("  - {}\n", reason));
        }
        for row in &outcome.row_failures {
            out.push_str(&format!(
                "  row {}:\n",
                canonical_json(&Value::Object(row.group.clone()))
            ));
            for failure in &row.failures {
                out.push_str(&format!("    - {}\n", failure));
            }
        }
    }

    if report.passed() {
        out.push_str(&format!(
            "Regression gate passed: {} rule(s) satisfied\n",
            report.total_rules()
        ));
    } else {
        out.push_str(&format!(
            "Regression gate failed: {} of {} rule(s) failed\n",
            report.total_failures(),
            report.total_rules()
        ));
    }
    out
}

/// One narration line per summary row.
pub fn render_summary_row(row: &SummaryRow) -> String {
    let optional = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"));
    let seeds = row
        .seed_count
        .map_or_else(|| "n/a".to_string(), |s| s.to_string());
    format!(
        "{} metric={} n={} seeds={} mean={:.4} stddev={} ci95={} min={:.4} max={:.4}",
        canonical_json(&Value::Object(row.group.clone())),
        row.metric,
        row.n,
        seeds,
        row.mean,
        optional(row.stddev),
        optional(row.ci95),
        row.min,
        row.max,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::RowFailure;
    use serde_json::{json, Map};

    fn group(simulation: &str) -> Map<String, Value> {
        let mut group = Map::new();
        group.insert("simulation".to_string(), json!(simulation));
        group
    }

    fn report() -> GateReport {
        GateReport {
            outcomes: vec![
                RuleOutcome {
                    name: "auction-floor".to_string(),
                    passed: true,
                    matched_rows: 1,
                    reason: None,
                    row_failures: vec![],
                },
                RuleOutcome {
                    name: "commons-floor".to_string(),
                    passed: false,
                    matched_rows: 1,
                    reason: None,
                    row_failures: vec![RowFailure {
                        group: group("commons"),
                        failures: vec![
                            "mean=41.2 < min_mean=45.0".to_string(),
                            "n=1 < min_runs=3".to_string(),
                        ],
                    }],
                },
                RuleOutcome {
                    name: "{\"simulation\": \"missing\"}".to_string(),
                    passed: false,
                    matched_rows: 0,
                    reason: Some("no summary row matched {\"simulation\": \"missing\"}".to_string()),
                    row_failures: vec![],
                },
            ],
        }
    }

    #[test]
    fn gate_report_render_is_stable() {
        let actual = render_gate_report(&report());
        let expected = "PASS: auction-floor\n\
FAIL: commons-floor\n  row {\"simulation\": \"commons\"}:\n    - mean=41.2 < min_mean=45.0\n    - n=1 < min_runs=3\n\
FAIL: {\"simulation\": \"missing\"}\n  - no summary row matched {\"simulation\": \"missing\"}\n\
Regression gate failed: 2 of 3 rule(s) failed\n";
        assert_eq!(actual, expected);
    }

    #[test]
    fn passing_report_summary_line() {
        let report = GateReport {
            outcomes: vec![report().outcomes.remove(0)],
        };
        assert!(render_gate_report(&report).ends_with("Regression gate passed: 1 rule(s) satisfied\n"));
    }

    #[test]
    fn gate_report_artifact_has_expected_keys() {
        let artifact = GateReportArtifact::new(&report(), "aaa", "bbb");
        let raw = serde_json::to_value(&artifact).expect("serialize");
        let obj = raw.as_object().expect("object");
        for key in [
            "schema_version",
            "evaluated_at",
            "summary_digest",
            "baseline_digest",
            "total_rules",
            "total_failures",
            "passed",
            "rules",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(raw["total_failures"], json!(2));
        assert_eq!(raw["passed"], json!(false));
        assert_eq!(raw["rules"][1]["row_failures"][0]["failures"][0], json!("mean=41.2 < min_mean=45.0"));
    }

    #[test]
    fn content_digest_is_sha256_hex() {
        assert_eq!(
            content_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn summary_row_narration() {
        let row = SummaryRow {
            group: group("auction"),
            metric: "auto".to_string(),
            n: 2,
            seed_count: Some(2),
            mean: 45.0,
            stddev: Some(50.0_f64.sqrt()),
            ci95: Some(9.8),
            min: 40.0,
            max: 50.0,
        };
        assert_eq!(
            render_summary_row(&row),
            "{\"simulation\": \"auction\"} metric=auto n=2 seeds=2 mean=45.0000 stddev=7.0711 ci95=9.8000 min=40.0000 max=50.0000"
        );
    }
}
