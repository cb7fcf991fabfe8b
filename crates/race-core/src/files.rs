//! Document files: JSON input loading and atomic output writes.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::domain::{RaceError, Result, SummaryDocument};
use crate::reporting::content_digest;

/// A JSON input document together with the digest of its raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    pub path: PathBuf,
    pub value: Value,
    /// SHA-256 hex of the file contents as read.
    pub digest: String,
}

/// Read and parse a JSON document. Unreadable files and invalid JSON are
/// fatal and name the path.
pub fn read_json_document(path: &Path) -> Result<JsonDocument> {
    let bytes = std::fs::read(path).map_err(|source| RaceError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_slice(&bytes).map_err(|source| RaceError::ParseFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(JsonDocument {
        path: path.to_path_buf(),
        value,
        digest: content_digest(&bytes),
    })
}

/// Resolve `path` against `root` unless it is already absolute.
pub fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Write a summary document as pretty JSON.
pub fn write_summary_json(path: &Path, document: &SummaryDocument) -> Result<()> {
    write_json_atomic(path, document)
}

/// Serialize `value` fully, then replace `path` in one rename so readers never
/// observe a partial file. Parent directories are created as needed.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut content = serde_json::to_vec_pretty(value)?;
    content.push(b'\n');

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(&content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| RaceError::Io(e.error))?;
    Ok(())
}
