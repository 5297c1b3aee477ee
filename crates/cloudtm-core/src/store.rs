//! `.cloudtm/` store layout and pointer access

use crate::error::{CoreError, Result};
use crate::pointer::{CurrentPointer, RollbackPointer, read_json, write_json_atomic};
use crate::state::STATE_FILE;
use std::path::{Path, PathBuf};

pub const STORE_DIR: &str = ".cloudtm";
pub const VERSIONS_DIR: &str = "versions";
pub const META_DIR: &str = "meta";
pub const ROLLBACK_DIR: &str = "rollback";
pub const CURRENT_FILE: &str = "current.json";
pub const ROLLBACK_FILE: &str = "rollback.json";
/// Directory inside a version that holds the configuration copy.
pub const CONFIGS_DIR: &str = "tf_configs";

/// What [`Store::initialize`] had to create
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitReport {
    pub created_store: bool,
    pub created_current: bool,
    pub created_rollback: bool,
}

/// Handle on the snapshot store of one Terraform project
#[derive(Debug, Clone)]
pub struct Store {
    project_root: PathBuf,
}

impl Store {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    /// Store for the current working directory.
    pub fn from_current_dir() -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn root(&self) -> PathBuf {
        self.project_root.join(STORE_DIR)
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root().join(VERSIONS_DIR)
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.versions_dir().join(version)
    }

    pub fn version_configs_dir(&self, version: &str) -> PathBuf {
        self.version_dir(version).join(CONFIGS_DIR)
    }

    pub fn version_state_path(&self, version: &str) -> PathBuf {
        self.version_dir(version).join(STATE_FILE)
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.root().join(META_DIR)
    }

    pub fn meta_path(&self, version: &str) -> PathBuf {
        self.meta_dir().join(format!("{}.json", version))
    }

    pub fn current_path(&self) -> PathBuf {
        self.root().join(CURRENT_FILE)
    }

    pub fn rollback_path(&self) -> PathBuf {
        self.root().join(ROLLBACK_FILE)
    }

    pub fn rollback_dir(&self) -> PathBuf {
        self.root().join(ROLLBACK_DIR)
    }

    /// The project's live Terraform state file.
    pub fn state_path(&self) -> PathBuf {
        self.project_root.join(STATE_FILE)
    }

    pub fn is_initialized(&self) -> bool {
        self.root().is_dir()
    }

    pub fn require_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(CoreError::NotInitialized(self.project_root.clone()))
        }
    }

    /// Create the store directories and default pointer documents.
    ///
    /// Existing documents are left untouched.
    #[tracing::instrument(skip(self), fields(root = %self.root().display()))]
    pub fn initialize(&self) -> Result<InitReport> {
        let mut report = InitReport {
            created_store: !self.is_initialized(),
            ..Default::default()
        };

        for dir in [self.versions_dir(), self.meta_dir()] {
            std::fs::create_dir_all(&dir).map_err(CoreError::io_at(&dir))?;
        }

        if !self.current_path().exists() {
            self.write_current(&CurrentPointer::default())?;
            report.created_current = true;
        }

        if !self.rollback_path().exists() {
            self.write_rollback(&RollbackPointer::default())?;
            report.created_rollback = true;
        }

        tracing::info!(?report, "Store initialized");
        Ok(report)
    }

    pub fn read_current(&self) -> Result<CurrentPointer> {
        read_json(&self.current_path())
    }

    pub fn write_current(&self, pointer: &CurrentPointer) -> Result<()> {
        write_json_atomic(&self.current_path(), pointer)
    }

    /// Update only the `status` flag of `current.json`.
    pub fn set_current_status(&self, status: bool) -> Result<()> {
        let mut pointer = self.read_current()?;
        pointer.status = status;
        self.write_current(&pointer)
    }

    pub fn read_rollback(&self) -> Result<RollbackPointer> {
        read_json(&self.rollback_path())
    }

    pub fn write_rollback(&self, pointer: &RollbackPointer) -> Result<()> {
        write_json_atomic(&self.rollback_path(), pointer)
    }
}
