//! Run record sources.
//!
//! The simulation engines write each results file as a JSON list of run
//! records. [`load_all`] reads several sources concurrently and concatenates
//! them in argument order; aggregation happens afterwards on a single owner.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{RaceError, Result, RunRecord};
use crate::obs;

/// Anything that can produce run records.
#[async_trait]
pub trait RunRecordSource: Send + Sync {
    /// Human-readable origin, used in logs.
    fn label(&self) -> String;

    /// Load every record, preserving the source's internal order.
    async fn load(&self) -> Result<Vec<RunRecord>>;
}

/// A results file holding a JSON list of run records.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RunRecordSource for JsonFileSource {
    fn label(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Vec<RunRecord>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| RaceError::ReadFile {
                path: self.path.clone(),
                source,
            })?;
        parse_run_records(&self.path, &bytes)
    }
}

/// Parse a results file body. The top level must be a list and every entry
/// an object.
pub fn parse_run_records(path: &Path, bytes: &[u8]) -> Result<Vec<RunRecord>> {
    let value: Value = serde_json::from_slice(bytes).map_err(|source| RaceError::ParseFile {
        path: path.to_path_buf(),
        source,
    })?;

    let Value::Array(entries) = value else {
        return Err(RaceError::invalid_document(
            "results",
            format!("{} is not a JSON list of run records", path.display()),
        ));
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            if !entry.is_object() {
                return Err(RaceError::invalid_document(
                    "results",
                    format!("{} entry {index} is not an object", path.display()),
                ));
            }
            serde_json::from_value(entry).map_err(|source| RaceError::ParseFile {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}

/// In-memory source for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    label: String,
    records: Vec<RunRecord>,
}

impl MemoryRecordSource {
    pub fn new(label: &str, records: Vec<RunRecord>) -> Self {
        Self {
            label: label.to_string(),
            records,
        }
    }
}

#[async_trait]
impl RunRecordSource for MemoryRecordSource {
    fn label(&self) -> String {
        self.label.clone()
    }

    async fn load(&self) -> Result<Vec<RunRecord>> {
        Ok(self.records.clone())
    }
}

/// Load every source concurrently and concatenate in argument order.
///
/// The first failing source aborts the whole load.
pub async fn load_all(sources: &[Box<dyn RunRecordSource>]) -> Result<Vec<RunRecord>> {
    let loaded = futures::future::try_join_all(sources.iter().map(|source| async move {
        let records = source.load().await?;
        obs::emit_records_loaded(&source.label(), records.len());
        Ok::<_, RaceError>(records)
    }))
    .await?;

    Ok(loaded.into_iter().flatten().collect())
}
