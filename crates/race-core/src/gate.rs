//! Regression gate controller.
//!
//! Runs every baseline rule against a loaded summary and produces a
//! [`GateReport`]: one [`RuleOutcome`] per rule, in document order. A rule
//! fails once no matter how many rows or checks failed, and rule failures
//! never stop evaluation of later rules.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{canonical_json, BaselineDocument, BaselineRule, LoadedSummary, RuleEntry};
use crate::metrics::METRICS;
use crate::obs;
use crate::rules::{evaluate_rule_row, RowView};

/// Process exit status when every rule passed.
pub const EXIT_PASSED: i32 = 0;
/// Process exit status when one or more rules failed.
pub const EXIT_RULES_FAILED: i32 = 1;
/// Process exit status for unreadable or structurally invalid inputs.
pub const EXIT_FATAL: i32 = 2;

/// Threshold failures for one matched row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowFailure {
    /// The row's `group` mapping (empty if the row had none).
    pub group: Map<String, Value>,
    pub failures: Vec<String>,
}

/// The verdict for one baseline rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleOutcome {
    pub name: String,
    pub passed: bool,
    /// Number of summary rows selected by `match` (0 for invalid rules).
    pub matched_rows: usize,
    /// Rule-level failure: invalid definition, no match, or ambiguous match.
    pub reason: Option<String>,
    /// Per-row threshold failures, only rows with at least one failure.
    pub row_failures: Vec<RowFailure>,
}

impl RuleOutcome {
    fn rejected(name: &str, matched_rows: usize, reason: String) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            matched_rows,
            reason: Some(reason),
            row_failures: Vec::new(),
        }
    }
}

/// Outcome of running the whole baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateReport {
    pub outcomes: Vec<RuleOutcome>,
}

impl GateReport {
    /// Number of failed rules (not rows, not checks).
    pub fn total_failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed).count()
    }

    pub fn total_rules(&self) -> usize {
        self.outcomes.len()
    }

    pub fn passed(&self) -> bool {
        self.total_failures() == 0
    }

    /// [`EXIT_PASSED`] or [`EXIT_RULES_FAILED`].
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            EXIT_PASSED
        } else {
            EXIT_RULES_FAILED
        }
    }
}

/// Evaluate every rule of `baseline` against `summary`.
pub fn run_gate(summary: &LoadedSummary, baseline: &BaselineDocument) -> GateReport {
    let outcomes: Vec<RuleOutcome> = baseline
        .rules
        .iter()
        .map(|entry| {
            let outcome = match entry {
                RuleEntry::Invalid { name, reason } => {
                    RuleOutcome::rejected(name, 0, reason.clone())
                }
                RuleEntry::Rule(rule) => evaluate_rule(summary, rule, baseline.metric.as_deref()),
            };
            METRICS.record_rule(outcome.passed);
            obs::emit_rule_evaluated(&outcome.name, outcome.matched_rows, outcome.passed);
            outcome
        })
        .collect();

    let report = GateReport { outcomes };
    obs::emit_gate_evaluated(report.total_rules(), report.total_failures());
    report
}

fn evaluate_rule(
    summary: &LoadedSummary,
    rule: &BaselineRule,
    default_metric: Option<&str>,
) -> RuleOutcome {
    let matched: Vec<RowView<'_>> = summary
        .rows
        .iter()
        .map(RowView::new)
        .filter(|row| row_matches(row, &rule.match_fields))
        .collect();

    if matched.is_empty() {
        return RuleOutcome::rejected(
            &rule.name,
            0,
            format!(
                "no summary row matched {}",
                canonical_json(&Value::Object(rule.match_fields.clone()))
            ),
        );
    }

    if matched.len() > 1 && !rule.allow_multiple {
        return RuleOutcome::rejected(
            &rule.name,
            matched.len(),
            format!(
                "ambiguous match: {} summary rows matched {} (set allow_multiple to evaluate all)",
                matched.len(),
                canonical_json(&Value::Object(rule.match_fields.clone()))
            ),
        );
    }

    let row_failures: Vec<RowFailure> = matched
        .iter()
        .filter_map(|row| {
            let failures = evaluate_rule_row(*row, rule, default_metric);
            (!failures.is_empty()).then(|| RowFailure {
                group: row.group().cloned().unwrap_or_default(),
                failures,
            })
        })
        .collect();

    RuleOutcome {
        name: rule.name.clone(),
        passed: row_failures.is_empty(),
        matched_rows: matched.len(),
        reason: None,
        row_failures,
    }
}

/// Partial-key match: every `match` pair must agree with the row's `group`;
/// extra group fields are ignored.
pub fn row_matches(row: &RowView<'_>, match_fields: &Map<String, Value>) -> bool {
    let Some(group) = row.group() else {
        return false;
    };
    match_fields
        .iter()
        .all(|(key, expected)| group.get(key).is_some_and(|actual| values_equal(actual, expected)))
}

/// JSON equality where numbers compare by value (`1` equals `1.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}
