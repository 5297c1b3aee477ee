//! Core error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("CloudTimeMachine not initialized in {0}. Run: cloudtm init")]
    NotInitialized(PathBuf),

    #[error("State file not found: {0}")]
    StateNotFound(PathBuf),

    #[error("Version '{0}' does not exist")]
    VersionNotFound(String),

    #[error("Resources still exist in terraform.tfstate ({0} resources)")]
    ResourcesStillExist(usize),

    #[error("Rollback to version '{0}' is already applied")]
    RollbackActive(String),

    #[error("Invalid version id: {0}")]
    InvalidVersion(String),

    #[error("Invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("IO error: {path}\nReason: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error in {path}: {source}")]
    JsonAt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn io_at(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CoreError::IoAt { path, source }
    }

    pub(crate) fn json_at(path: impl Into<PathBuf>) -> impl FnOnce(serde_json::Error) -> Self {
        let path = path.into();
        move |source| CoreError::JsonAt { path, source }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
