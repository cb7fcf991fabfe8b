//! Rule evaluator: one baseline rule against one summary row.
//!
//! Every configured check runs; a row can report several violations at once.

use serde_json::{Map, Value};

use crate::domain::BaselineRule;

/// Read-only accessors over a raw summary row.
///
/// Fields that are absent or of the wrong JSON type read as `None`.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    row: &'a Value,
}

impl<'a> RowView<'a> {
    pub fn new(row: &'a Value) -> Self {
        Self { row }
    }

    pub fn group(&self) -> Option<&'a Map<String, Value>> {
        self.row.get("group").and_then(Value::as_object)
    }

    pub fn metric(&self) -> Option<&'a str> {
        self.row.get("metric").and_then(Value::as_str)
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        self.row.get(field).and_then(Value::as_i64)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.row.get(field).and_then(Value::as_f64)
    }
}

/// Evaluate `rule` against `row`, returning one message per violated check.
///
/// `default_metric` is the baseline document's `metric`, used when the rule
/// does not name its own.
pub fn evaluate_rule_row(
    row: RowView<'_>,
    rule: &BaselineRule,
    default_metric: Option<&str>,
) -> Vec<String> {
    let mut failures = Vec::new();

    if let Some(expected) = rule.metric.as_deref().or(default_metric) {
        let actual = row.metric();
        if actual != Some(expected) {
            failures.push(format!(
                "metric mismatch: expected {:?}, got {}",
                expected,
                actual.map_or_else(|| "none".to_string(), |m| format!("{m:?}")),
            ));
        }
    }

    if let Some(min_runs) = rule.min_runs {
        match row.integer("n") {
            None => failures.push(format!("n missing for min_runs={min_runs}")),
            Some(n) if n < min_runs => failures.push(format!("n={n} < min_runs={min_runs}")),
            Some(_) => {}
        }
    }

    if let Some(min_seeds) = rule.min_seed_count {
        match row.integer("seed_count") {
            None => failures.push(format!("seed_count missing for min_seed_count={min_seeds}")),
            Some(seeds) if seeds < min_seeds => {
                failures.push(format!("seed_count={seeds} < min_seed_count={min_seeds}"))
            }
            Some(_) => {}
        }
    }

    check_lower(&mut failures, row, "mean", "min_mean", rule.min_mean);
    check_upper(&mut failures, row, "mean", "max_mean", rule.max_mean);
    check_upper(&mut failures, row, "stddev", "max_stddev", rule.max_stddev);
    check_upper(&mut failures, row, "ci95", "max_ci95", rule.max_ci95);

    if rule.require_ci95 && row.number("ci95").is_none() {
        failures.push("ci95 missing (require_ci95=true)".to_string());
    }

    failures
}

fn check_lower(
    failures: &mut Vec<String>,
    row: RowView<'_>,
    field: &str,
    threshold_name: &str,
    threshold: Option<f64>,
) {
    let Some(bound) = threshold else { return };
    match row.number(field) {
        None => failures.push(format!("{field} missing for {threshold_name}={bound:?}")),
        Some(actual) if actual < bound => {
            failures.push(format!("{field}={actual:?} < {threshold_name}={bound:?}"))
        }
        Some(_) => {}
    }
}

fn check_upper(
    failures: &mut Vec<String>,
    row: RowView<'_>,
    field: &str,
    threshold_name: &str,
    threshold: Option<f64>,
) {
    let Some(bound) = threshold else { return };
    match row.number(field) {
        None => failures.push(format!("{field} missing for {threshold_name}={bound:?}")),
        Some(actual) if actual > bound => {
            failures.push(format!("{field}={actual:?} > {threshold_name}={bound:?}"))
        }
        Some(_) => {}
    }
}
