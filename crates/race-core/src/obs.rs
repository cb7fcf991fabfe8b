//! Structured observability hooks for summarizer and gate lifecycle events.
//!
//! This module provides:
//! - Invocation-scoped tracing spans via the `GateSpan` RAII guard
//! - Emission functions for key events: records loaded, summary written,
//!   rule evaluated, gate evaluated
//!
//! Events are emitted at `info!` level (filter with `RUST_LOG`).

use std::path::Path;

use tracing::info;

/// RAII guard that enters a span for one summarize or gate invocation.
///
/// # Example
///
/// ```ignore
/// let _span = GateSpan::enter("gate", "baselines/regression.json");
/// // every event below is tagged with command = "gate"
/// ```
pub struct GateSpan {
    _span: tracing::span::EnteredSpan,
}

impl GateSpan {
    /// Create and enter a span tagged with the command and its primary input.
    pub fn enter(command: &str, input: &str) -> Self {
        let span = tracing::info_span!("race", command = %command, input = %input);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: run records loaded from one source.
pub fn emit_records_loaded(source: &str, records: usize) {
    info!(event = "records.loaded", source = %source, records = records);
}

/// Emit event: summary document written.
pub fn emit_summary_written(path: &Path, rows: usize, scanned: usize, skipped: usize) {
    info!(
        event = "summary.written",
        path = %path.display(),
        rows = rows,
        records_scanned = scanned,
        records_skipped = skipped,
    );
}

/// Emit event: one baseline rule evaluated.
pub fn emit_rule_evaluated(rule: &str, matched_rows: usize, passed: bool) {
    info!(
        event = "gate.rule_evaluated",
        rule = %rule,
        matched_rows = matched_rows,
        passed = passed,
    );
}

/// Emit event: gate evaluation completed.
pub fn emit_gate_evaluated(total_rules: usize, total_failures: usize) {
    info!(
        event = "gate.evaluated",
        total_rules = total_rules,
        total_failures = total_failures,
        passed = total_failures == 0,
    );
}

/// Emit event: fatal input error (warning level).
pub fn emit_fatal_input(path: &Path, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "input.fatal", path = %path.display(), error = %error);
}
