//! Baseline rule schema (`regression_gate_v1`).
//!
//! Baselines are parsed leniently: only the top-level shape is fatal. A rule
//! entry that is not an object, or has no usable `match`, becomes a
//! [`RuleEntry::Invalid`] and is reported as one failed rule. Threshold fields
//! with the wrong JSON type are ignored, the same way an absent field is.

use serde_json::{Map, Value};

use super::error::{RaceError, Result};

/// Schema tag expected on baseline documents.
pub const BASELINE_SCHEMA_VERSION: &str = "regression_gate_v1";

/// One declarative threshold rule.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineRule {
    /// Explicit name, or the canonical JSON of `match`.
    pub name: String,
    /// Non-empty partial group key.
    pub match_fields: Map<String, Value>,
    pub metric: Option<String>,
    pub min_runs: Option<i64>,
    pub min_seed_count: Option<i64>,
    pub min_mean: Option<f64>,
    pub max_mean: Option<f64>,
    pub max_stddev: Option<f64>,
    pub max_ci95: Option<f64>,
    pub require_ci95: bool,
    pub allow_multiple: bool,
}

impl BaselineRule {
    /// Build a rule that only carries a match key. Thresholds are set with
    /// the public fields.
    pub fn matching(match_fields: Map<String, Value>) -> Self {
        Self {
            name: derive_rule_name(&match_fields),
            match_fields,
            metric: None,
            min_runs: None,
            min_seed_count: None,
            min_mean: None,
            max_mean: None,
            max_stddev: None,
            max_ci95: None,
            require_ci95: false,
            allow_multiple: false,
        }
    }

    fn from_object(obj: &Map<String, Value>, match_fields: Map<String, Value>) -> Self {
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| derive_rule_name(&match_fields));

        Self {
            name,
            match_fields,
            metric: obj.get("metric").and_then(Value::as_str).map(str::to_string),
            min_runs: integer_field(obj, "min_runs"),
            min_seed_count: integer_field(obj, "min_seed_count"),
            min_mean: number_field(obj, "min_mean"),
            max_mean: number_field(obj, "max_mean"),
            max_stddev: number_field(obj, "max_stddev"),
            max_ci95: number_field(obj, "max_ci95"),
            require_ci95: obj.get("require_ci95").and_then(Value::as_bool) == Some(true),
            allow_multiple: obj.get("allow_multiple").and_then(Value::as_bool) == Some(true),
        }
    }
}

/// A rule slot in the baseline, valid or not.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleEntry {
    Rule(BaselineRule),
    /// A rule definition error. Counted as one failed rule.
    Invalid { name: String, reason: String },
}

impl RuleEntry {
    pub fn name(&self) -> &str {
        match self {
            RuleEntry::Rule(rule) => &rule.name,
            RuleEntry::Invalid { name, .. } => name,
        }
    }

    fn from_value(index: usize, value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return RuleEntry::Invalid {
                name: format!("rule[{index}]"),
                reason: "rule entry is not an object".to_string(),
            };
        };

        match obj.get("match").and_then(Value::as_object) {
            Some(match_fields) if !match_fields.is_empty() => {
                RuleEntry::Rule(BaselineRule::from_object(obj, match_fields.clone()))
            }
            _ => RuleEntry::Invalid {
                name: obj
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("rule[{index}]")),
                reason: "rule is missing a non-empty 'match' object".to_string(),
            },
        }
    }
}

/// A parsed baseline document.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineDocument {
    pub schema_version: Option<String>,
    /// Default expected metric for rules that omit one.
    pub metric: Option<String>,
    pub rules: Vec<RuleEntry>,
}

impl BaselineDocument {
    /// Validate the top-level shape: the document must carry a non-empty
    /// `rules` list. Individual rule problems are deferred to the gate.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| RaceError::invalid_document("baseline", "top level is not an object"))?;
        let rules = obj
            .get("rules")
            .and_then(Value::as_array)
            .filter(|rules| !rules.is_empty())
            .ok_or_else(|| {
                RaceError::invalid_document("baseline", "missing non-empty 'rules' list")
            })?;

        let schema_version = obj
            .get("schema_version")
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(version) = schema_version.as_deref() {
            if version != BASELINE_SCHEMA_VERSION {
                tracing::warn!(
                    expected = BASELINE_SCHEMA_VERSION,
                    actual = %version,
                    "baseline schema_version mismatch"
                );
            }
        }

        Ok(Self {
            schema_version,
            metric: obj.get("metric").and_then(Value::as_str).map(str::to_string),
            rules: rules
                .iter()
                .enumerate()
                .map(|(i, v)| RuleEntry::from_value(i, v))
                .collect(),
        })
    }
}

fn integer_field(obj: &Map<String, Value>, key: &str) -> Option<i64> {
    obj.get(key).and_then(Value::as_i64)
}

fn number_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

/// Name given to a rule without an explicit `name`.
pub fn derive_rule_name(match_fields: &Map<String, Value>) -> String {
    let mut out = String::new();
    write_canonical_object(match_fields, &mut out);
    out
}

/// Canonical JSON rendering used for derived names and report lines.
///
/// Object keys are sorted at every depth, items are separated by `", "` and
/// keys from values by `": "`; strings use JSON escaping with every
/// non-ASCII character written as a lowercase `\uXXXX` escape (UTF-16 code
/// units, so astral characters become surrogate pairs). For example `{"variant": "y", "simulation": "x"}` renders as
/// `{"simulation": "x", "variant": "y"}`.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_canonical_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::String(text) => write_ascii_string(text, out),
        // Remaining scalars render identically in compact JSON.
        other => out.push_str(&other.to_string()),
    }
}

fn write_canonical_object(map: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_ascii_string(key, out);
        out.push_str(": ");
        write_canonical(&map[key], out);
    }
    out.push('}');
}

fn write_ascii_string(text: &str, out: &mut String) {
    let escaped = Value::from(text).to_string();
    for c in escaped.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
}
