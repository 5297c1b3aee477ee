//! Pointer documents
//!
//! `current.json` names the newest snapshot and whether its infrastructure is
//! live. `rollback.json` names the snapshot materialized in the rollback
//! working directory. Both are small records rewritten as a whole.

use crate::error::{CoreError, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;

/// Contents of `current.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CurrentPointer {
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub status: bool,
}

impl CurrentPointer {
    pub fn new(current: impl Into<String>, status: bool) -> Self {
        Self {
            current: current.into(),
            status,
        }
    }

    /// The recorded version, if any.
    pub fn version(&self) -> Option<&str> {
        (!self.current.is_empty()).then_some(self.current.as_str())
    }
}

/// Contents of `rollback.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RollbackPointer {
    #[serde(default)]
    pub rollback: String,
}

impl RollbackPointer {
    pub fn new(rollback: impl Into<String>) -> Self {
        Self {
            rollback: rollback.into(),
        }
    }

    /// The version of the active rollback, if one is in progress.
    pub fn active(&self) -> Option<&str> {
        (!self.rollback.is_empty()).then_some(self.rollback.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rollback.is_empty()
    }
}

/// Read and decode a JSON document. A missing file is an error.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(CoreError::io_at(path))?;
    serde_json::from_str(&content).map_err(CoreError::json_at(path))
}

/// Encode `value` and replace `path` with it.
///
/// The document is written to a temporary sibling first and renamed into
/// place, so readers never see a half-written file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(CoreError::io_at(dir))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.json".to_string());
    let tmp = dir.join(format!(".{}.tmp.{}", file_name, std::process::id()));

    std::fs::write(&tmp, content).map_err(CoreError::io_at(&tmp))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(CoreError::IoAt {
            path: path.to_path_buf(),
            source: e,
        });
    }

    tracing::debug!(path = %path.display(), "Wrote document");
    Ok(())
}
