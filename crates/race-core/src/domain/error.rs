//! Error taxonomy for race summarization and gating.

use std::path::PathBuf;

/// Fatal errors. Anything that reaches the caller as a `RaceError` aborts the
/// invocation before a report or output file is produced.
#[derive(Debug, thiserror::Error)]
pub enum RaceError {
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON in {path}: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {document} document: {reason}")]
    InvalidDocument { document: String, reason: String },

    #[error("invalid metric specifier: {0:?}")]
    InvalidMetric(String),

    #[error("invalid group-by list: {0}")]
    InvalidGroupBy(String),

    #[error("group {group} mixes resolved metrics: {keys:?}")]
    MixedMetricResolution { group: String, keys: Vec<String> },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RaceError {
    pub(crate) fn invalid_document(document: &str, reason: impl Into<String>) -> Self {
        RaceError::InvalidDocument {
            document: document.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for race operations.
pub type Result<T> = std::result::Result<T, RaceError>;
