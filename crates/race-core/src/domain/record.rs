//! Raw run records as written by the simulation engines.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One simulation run: run-level fields plus one result per participating agent.
///
/// `simulation`, `variant` and `seed` are the documented run-level fields, but
/// any other top-level field is kept in `fields` and becomes part of every
/// observation's namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    /// Per-agent results. `null` or absent is treated as empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<Value>>,

    /// Every top-level field except `results`.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RunRecord {
    /// Create a record with the three documented run-level fields.
    pub fn new(simulation: &str, variant: &str, seed: u64) -> Self {
        let mut fields = Map::new();
        fields.insert("simulation".to_string(), Value::from(simulation));
        fields.insert("variant".to_string(), Value::from(variant));
        fields.insert("seed".to_string(), Value::from(seed));
        Self {
            results: Some(Vec::new()),
            fields,
        }
    }

    /// Append an agent result.
    pub fn with_result(mut self, result: Value) -> Self {
        self.results.get_or_insert_with(Vec::new).push(result);
        self
    }

    pub fn simulation(&self) -> Option<&str> {
        self.fields.get("simulation").and_then(Value::as_str)
    }

    pub fn variant(&self) -> Option<&str> {
        self.fields.get("variant").and_then(Value::as_str)
    }

    pub fn seed(&self) -> Option<i64> {
        self.fields.get("seed").and_then(Value::as_i64)
    }

    /// Agent results, empty when the record carried none.
    pub fn results(&self) -> &[Value] {
        self.results.as_deref().unwrap_or(&[])
    }
}
