//! Summary document schema (`race_summary_v1`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{RaceError, Result};

/// Schema tag written into every summary document.
pub const SUMMARY_SCHEMA_VERSION: &str = "race_summary_v1";

/// Statistics for one group of observations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRow {
    /// The group-by fields and the values shared by every pooled observation.
    pub group: Map<String, Value>,
    /// The configured metric specifier, or the concrete key when concrete
    /// reporting is enabled.
    pub metric: String,
    pub n: usize,
    /// Distinct seeds seen. Omitted when no observation carried a `seed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_count: Option<usize>,
    pub mean: f64,
    /// Sample standard deviation; `null` when `n < 2`.
    pub stddev: Option<f64>,
    /// 95% confidence half-width; `null` when `stddev` is.
    pub ci95: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// Output of the summarizer.
///
/// # Invariants
///
/// `records_scanned` counts every observation considered and
/// `records_skipped_missing_metric` the ones whose metric did not resolve, so
/// `Σ rows.n + records_skipped_missing_metric == records_scanned` whenever
/// every resolved observation carried all group-by fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryDocument {
    pub schema_version: String,
    pub group_by: Vec<String>,
    pub records_scanned: usize,
    pub records_skipped_missing_metric: usize,
    pub rows: Vec<SummaryRow>,
}

impl SummaryDocument {
    pub fn new(
        group_by: Vec<String>,
        records_scanned: usize,
        records_skipped_missing_metric: usize,
        rows: Vec<SummaryRow>,
    ) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION.to_string(),
            group_by,
            records_scanned,
            records_skipped_missing_metric,
            rows,
        }
    }

    /// Total observations folded into rows.
    pub fn pooled_observations(&self) -> usize {
        self.rows.iter().map(|r| r.n).sum()
    }
}

/// A summary document as seen by the gate.
///
/// Rows are kept as raw JSON so that a row with a missing or non-numeric
/// statistic becomes a rule failure instead of a parse error. Only the
/// top-level shape is validated.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSummary {
    pub schema_version: Option<String>,
    pub rows: Vec<Value>,
}

impl LoadedSummary {
    /// Validate the top-level shape: the document must carry a `rows` list.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| RaceError::invalid_document("summary", "top level is not an object"))?;
        let rows = obj
            .get("rows")
            .and_then(Value::as_array)
            .ok_or_else(|| RaceError::invalid_document("summary", "missing 'rows' list"))?;

        let schema_version = obj
            .get("schema_version")
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(version) = schema_version.as_deref() {
            if version != SUMMARY_SCHEMA_VERSION {
                tracing::warn!(
                    expected = SUMMARY_SCHEMA_VERSION,
                    actual = %version,
                    "summary schema_version mismatch"
                );
            }
        }

        Ok(Self {
            schema_version,
            rows: rows.clone(),
        })
    }
}
