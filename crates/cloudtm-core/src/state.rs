//! Terraform state inspection
//!
//! Only the top-level `resources` array of `terraform.tfstate` is looked at.

use crate::error::{CoreError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name Terraform uses for local state.
pub const STATE_FILE: &str = "terraform.tfstate";

#[derive(Debug, Deserialize)]
struct TerraformState {
    #[serde(default)]
    resources: Vec<serde_json::Value>,
}

/// Result of inspecting a state document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSummary {
    pub path: PathBuf,
    pub resource_count: usize,
}

impl StateSummary {
    pub fn is_empty(&self) -> bool {
        self.resource_count == 0
    }
}

/// Read the state document at `path` and count its resources.
///
/// A missing file, an unreadable file and malformed JSON are all errors.
pub fn inspect_state(path: &Path) -> Result<StateSummary> {
    if !path.exists() {
        return Err(CoreError::StateNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(CoreError::io_at(path))?;
    let state: TerraformState = serde_json::from_str(&content).map_err(CoreError::json_at(path))?;

    tracing::debug!(
        path = %path.display(),
        resources = state.resources.len(),
        "Inspected terraform state"
    );

    Ok(StateSummary {
        path: path.to_path_buf(),
        resource_count: state.resources.len(),
    })
}

/// Whether the state document at `path` has no resources.
pub fn is_state_empty(path: &Path) -> Result<bool> {
    Ok(inspect_state(path)?.is_empty())
}
