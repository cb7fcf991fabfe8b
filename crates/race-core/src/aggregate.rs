//! Grouping aggregator: observations → `race_summary_v1` document.
//!
//! Observations whose metric does not resolve are counted in
//! `records_skipped_missing_metric`. Observations missing a group-by field are
//! dropped and counted separately in [`SummarizeOutcome::skipped_missing_group`];
//! that count is not part of the summary document.

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};

use crate::domain::{canonical_json, RaceError, Result, SummaryDocument, SummaryRow};
use crate::metric::MetricSpec;
use crate::metrics::METRICS;
use crate::observation::Observation;
use crate::stats::SampleStats;

/// Group-by fields used when none are configured.
pub const DEFAULT_GROUP_BY: &[&str] = &["simulation", "variant", "agent"];

/// Field whose distinct values feed `seed_count`.
pub const SEED_FIELD: &str = "seed";

/// What each row records in its `metric` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricReporting {
    /// The specifier as configured (`auto` stays `auto`).
    #[default]
    Configured,
    /// The concrete key that resolved. A bucket whose observations resolved
    /// through different keys is a fatal error.
    Concrete,
}

/// Summarization settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizeConfig {
    pub metric: MetricSpec,
    pub group_by: Vec<String>,
    pub reporting: MetricReporting,
}

impl SummarizeConfig {
    /// Create a config. `group_by` must be non-empty with unique, non-blank names.
    pub fn new(metric: MetricSpec, group_by: Vec<String>) -> Result<Self> {
        validate_group_by(&group_by)?;
        Ok(Self {
            metric,
            group_by,
            reporting: MetricReporting::default(),
        })
    }

    pub fn with_reporting(mut self, reporting: MetricReporting) -> Self {
        self.reporting = reporting;
        self
    }
}

/// Parse a comma-separated group-by list (`simulation,variant,agent`).
pub fn parse_group_by(raw: &str) -> Result<Vec<String>> {
    let fields: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    validate_group_by(&fields)?;
    Ok(fields)
}

fn validate_group_by(fields: &[String]) -> Result<()> {
    if fields.is_empty() {
        return Err(RaceError::InvalidGroupBy(
            "at least one field is required".to_string(),
        ));
    }
    let mut seen = BTreeSet::new();
    for field in fields {
        if field.trim().is_empty() {
            return Err(RaceError::InvalidGroupBy("blank field name".to_string()));
        }
        if !seen.insert(field.as_str()) {
            return Err(RaceError::InvalidGroupBy(format!("duplicate field {field:?}")));
        }
    }
    Ok(())
}

/// The summary document plus bookkeeping that does not belong in it.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizeOutcome {
    pub document: SummaryDocument,
    /// Resolved observations dropped because a group-by field was absent.
    pub skipped_missing_group: usize,
}

#[derive(Debug, Default)]
struct Bucket {
    group: Map<String, Value>,
    values: Vec<f64>,
    seeds: BTreeSet<String>,
    saw_seed: bool,
    resolved_keys: BTreeSet<String>,
}

impl Bucket {
    fn into_row(self, config: &SummarizeConfig) -> Result<Option<SummaryRow>> {
        let metric = match config.reporting {
            MetricReporting::Configured => config.metric.as_str().to_string(),
            MetricReporting::Concrete => {
                if self.resolved_keys.len() > 1 {
                    return Err(RaceError::MixedMetricResolution {
                        group: canonical_json(&Value::Object(self.group)),
                        keys: self.resolved_keys.into_iter().collect(),
                    });
                }
                self.resolved_keys
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| config.metric.as_str().to_string())
            }
        };

        let Some(stats) = SampleStats::from_values(&self.values) else {
            return Ok(None);
        };

        Ok(Some(SummaryRow {
            group: self.group,
            metric,
            n: stats.n,
            seed_count: self.saw_seed.then_some(self.seeds.len()),
            mean: stats.mean,
            stddev: stats.stddev,
            ci95: stats.ci95,
            min: stats.min,
            max: stats.max,
        }))
    }
}

/// Aggregate observations into one row per distinct group key.
///
/// Rows are emitted in first-seen group-key order, so identical input yields
/// an identical document.
pub fn summarize(
    observations: &[Observation],
    config: &SummarizeConfig,
) -> Result<SummarizeOutcome> {
    let mut records_scanned = 0usize;
    let mut skipped_missing_metric = 0usize;
    let mut skipped_missing_group = 0usize;

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();

    for observation in observations {
        records_scanned += 1;

        let Some(resolved) = config.metric.resolve(observation) else {
            skipped_missing_metric += 1;
            continue;
        };

        let Some(key_values) = group_values(observation, &config.group_by) else {
            skipped_missing_group += 1;
            continue;
        };

        let mut key = String::new();
        for value in &key_values {
            write_identity_key(value, &mut key);
            key.push(',');
        }
        let slot = *index.entry(key).or_insert_with(|| {
            let group = config
                .group_by
                .iter()
                .cloned()
                .zip(key_values.iter().map(|v| (*v).clone()))
                .collect();
            buckets.push(Bucket {
                group,
                ..Bucket::default()
            });
            buckets.len() - 1
        });

        let bucket = &mut buckets[slot];
        bucket.values.push(resolved.value);
        bucket.resolved_keys.insert(resolved.key.to_string());
        if let Some(seed) = observation.get(SEED_FIELD) {
            bucket.saw_seed = true;
            bucket.seeds.insert(identity_key(seed));
        }
    }

    if config.metric.is_auto() && config.reporting == MetricReporting::Configured {
        for bucket in buckets.iter().filter(|b| b.resolved_keys.len() > 1) {
            let group = canonical_json(&Value::Object(bucket.group.clone()));
            tracing::warn!(
                group = %group,
                keys = ?bucket.resolved_keys,
                "auto metric resolved through different keys within one group"
            );
        }
    }

    if skipped_missing_group > 0 {
        tracing::warn!(
            skipped = skipped_missing_group,
            group_by = ?config.group_by,
            "observations dropped for missing group-by fields"
        );
    }

    let mut rows = Vec::with_capacity(buckets.len());
    for bucket in buckets {
        if let Some(row) = bucket.into_row(config)? {
            rows.push(row);
        }
    }

    METRICS.add_observations_scanned(records_scanned as u64);
    METRICS.add_observations_skipped((skipped_missing_metric + skipped_missing_group) as u64);

    Ok(SummarizeOutcome {
        document: SummaryDocument::new(
            config.group_by.clone(),
            records_scanned,
            skipped_missing_metric,
            rows,
        ),
        skipped_missing_group,
    })
}

/// Identity of a JSON value for bucketing: numbers compare by value, so `1`
/// and `1.0` share a key, matching how the gate matches group values.
fn identity_key(value: &Value) -> String {
    let mut out = String::new();
    write_identity_key(value, &mut out);
    out
}

fn write_identity_key(value: &Value, out: &mut String) {
    match value {
        Value::Number(number) => match number.as_f64() {
            // -0.0 == 0.0
            Some(f) => {
                let f = if f == 0.0 { 0.0 } else { f };
                out.push_str(&format!("#{:016x}", f.to_bits()));
            }
            None => out.push_str(&number.to_string()),
        },
        Value::Array(items) => {
            out.push('[');
            for item in items {
                write_identity_key(item, out);
                out.push(',');
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for key in keys {
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_identity_key(&map[key], out);
                out.push(',');
            }
            out.push('}');
        }
        other => out.push_str(&other.to_string()),
    }
}

fn group_values<'o>(observation: &'o Observation, group_by: &[String]) -> Option<Vec<&'o Value>> {
    group_by.iter().map(|field| observation.get(field)).collect()
}
