//! Observation flattening: one lookup namespace per agent result.

use serde_json::{Map, Value};

use crate::domain::RunRecord;

/// One agent's result merged with its run's shared fields.
///
/// Agent fields take precedence over run-level fields on a name collision.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    fields: Map<String, Value>,
}

impl Observation {
    /// Merge run-level fields with one agent result.
    pub fn merge(run_fields: &Map<String, Value>, agent: &Map<String, Value>) -> Self {
        let mut fields = run_fields.clone();
        for (key, value) in agent {
            fields.insert(key.clone(), value.clone());
        }
        Self { fields }
    }

    /// Wrap an already-merged namespace.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Expand run records into observations, in record order then result order.
///
/// A record with no results contributes nothing. Result entries that are not
/// JSON objects carry no fields to look up and are dropped.
pub fn flatten_records(records: &[RunRecord]) -> Vec<Observation> {
    let mut observations = Vec::new();
    for record in records {
        for (index, result) in record.results().iter().enumerate() {
            match result.as_object() {
                Some(agent) => observations.push(Observation::merge(&record.fields, agent)),
                None => tracing::debug!(
                    simulation = record.simulation().unwrap_or("<unknown>"),
                    index,
                    "skipping non-object agent result"
                ),
            }
        }
    }
    observations
}
