//! Race Core Library
//!
//! Result aggregation and regression gating for simulation race runs:
//! run records are flattened into per-agent observations, pooled into
//! grouped statistics (`race_summary_v1`), and checked against declarative
//! baseline thresholds (`regression_gate_v1`).

pub mod aggregate;
pub mod domain;
pub mod files;
pub mod gate;
pub mod metric;
pub mod metrics;
pub mod obs;
pub mod observation;
pub mod reporting;
pub mod rules;
pub mod source;
pub mod stats;
pub mod telemetry;

pub use aggregate::{
    parse_group_by, summarize, MetricReporting, SummarizeConfig, SummarizeOutcome,
    DEFAULT_GROUP_BY,
};
pub use domain::{
    canonical_json, derive_rule_name, BaselineDocument, BaselineRule, LoadedSummary, RaceError,
    Result, RuleEntry, RunRecord, SummaryDocument, SummaryRow, BASELINE_SCHEMA_VERSION,
    SUMMARY_SCHEMA_VERSION,
};
pub use files::{read_json_document, resolve_against, write_summary_json, JsonDocument};
pub use gate::{
    run_gate, GateReport, RowFailure, RuleOutcome, EXIT_FATAL, EXIT_PASSED, EXIT_RULES_FAILED,
};
pub use metric::{MetricSpec, ResolvedMetric, AUTO_METRIC, AUTO_METRIC_CANDIDATES};
pub use metrics::METRICS;
pub use obs::GateSpan;
pub use observation::{flatten_records, Observation};
pub use reporting::{
    content_digest, render_gate_report, render_summary_row, write_gate_report_json,
    GateReportArtifact,
};
pub use rules::{evaluate_rule_row, RowView};
pub use source::{load_all, JsonFileSource, MemoryRecordSource, RunRecordSource};
pub use stats::SampleStats;
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
