//! Metric resolution against an observation.
//!
//! A specifier is one of:
//! - `auto`: the first candidate in [`AUTO_METRIC_CANDIDATES`] present as a number
//! - a dotted path (`ethics_score.fairness.ratio`) descending nested objects
//! - a literal key
//!
//! Resolution fails closed: anything that is not a number at the end of the
//! lookup is "unresolved", never an error.

use std::fmt;

use serde_json::Value;

use crate::domain::{RaceError, Result};
use crate::observation::Observation;

/// Specifier that selects the fallback chain.
pub const AUTO_METRIC: &str = "auto";

/// Keys tried in order for `auto`.
pub const AUTO_METRIC_CANDIDATES: &[&str] = &["composite_score", "final_balance"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum MetricKind {
    Auto,
    Path(Vec<String>),
    Key,
}

/// A parsed metric specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSpec {
    raw: String,
    kind: MetricKind,
}

/// A successfully resolved metric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedMetric<'a> {
    pub value: f64,
    /// The key that produced the value: the matched candidate for `auto`,
    /// otherwise the specifier itself.
    pub key: &'a str,
}

impl MetricSpec {
    /// Parse a specifier. Empty specifiers and paths with empty segments
    /// (`a..b`, `.a`) are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RaceError::InvalidMetric(raw.to_string()));
        }

        let kind = if raw == AUTO_METRIC {
            MetricKind::Auto
        } else if raw.contains('.') {
            let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
            if segments.iter().any(String::is_empty) {
                return Err(RaceError::InvalidMetric(raw.to_string()));
            }
            MetricKind::Path(segments)
        } else {
            MetricKind::Key
        };

        Ok(Self {
            raw: raw.to_string(),
            kind,
        })
    }

    pub fn auto() -> Self {
        Self {
            raw: AUTO_METRIC.to_string(),
            kind: MetricKind::Auto,
        }
    }

    /// The specifier as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_auto(&self) -> bool {
        self.kind == MetricKind::Auto
    }

    /// Resolve this specifier against one observation.
    pub fn resolve<'a>(&'a self, observation: &Observation) -> Option<ResolvedMetric<'a>> {
        match &self.kind {
            MetricKind::Auto => AUTO_METRIC_CANDIDATES.iter().find_map(|candidate| {
                number(observation.get(candidate)).map(|value| ResolvedMetric {
                    value,
                    key: *candidate,
                })
            }),
            MetricKind::Path(segments) => {
                let (first, rest) = segments.split_first()?;
                let leaf = descend(observation.get(first)?, rest);
                number(leaf).map(|value| ResolvedMetric {
                    value,
                    key: &self.raw,
                })
            }
            MetricKind::Key => number(observation.get(&self.raw)).map(|value| ResolvedMetric {
                value,
                key: &self.raw,
            }),
        }
    }
}

impl fmt::Display for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Walk `path` through nested objects starting at `root`.
///
/// Returns `None` as soon as a segment is missing or an intermediate value is
/// not an object.
pub fn descend<'v, S: AsRef<str>>(root: &'v Value, path: &[S]) -> Option<&'v Value> {
    let mut current = root;
    for segment in path {
        current = current.as_object()?.get(segment.as_ref())?;
    }
    Some(current)
}

fn number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}
