//! Domain models for race summaries.
//!
//! Canonical definitions for the documents exchanged at the process boundary:
//! - `RunRecord`: one simulation run, produced by the engines
//! - `SummaryDocument`: grouped statistics (`race_summary_v1`)
//! - `BaselineDocument`: regression thresholds (`regression_gate_v1`)

pub mod baseline;
pub mod error;
pub mod record;
pub mod summary;

pub use baseline::{
    canonical_json, derive_rule_name, BaselineDocument, BaselineRule, RuleEntry,
    BASELINE_SCHEMA_VERSION,
};
pub use error::{RaceError, Result};
pub use record::RunRecord;
pub use summary::{LoadedSummary, SummaryDocument, SummaryRow, SUMMARY_SCHEMA_VERSION};
