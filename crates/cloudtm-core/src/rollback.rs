//! Rollback working directory management

use crate::copy::{CopyStats, ExcludeRules, copy_file, copy_tree};
use crate::error::{CoreError, Result};
use crate::pointer::RollbackPointer;
use crate::state::{STATE_FILE, inspect_state};
use crate::store::{CONFIGS_DIR, Store};

/// Outcome of [`Store::materialize_rollback`]
#[derive(Debug, Clone)]
pub struct MaterializedRollback {
    pub version: String,
    pub copy: CopyStats,
    /// Whether `meta/<id>.json` was copied into the working directory.
    pub meta_copied: bool,
}

impl Store {
    /// Check that a rollback to `target` may start.
    ///
    /// Checked in order, the first failure wins:
    /// 1. the live state has no resources
    /// 2. no rollback is active
    /// 3. the target version exists
    pub fn check_rollback_preconditions(&self, target: &str) -> Result<()> {
        let state = inspect_state(&self.state_path())?;
        if !state.is_empty() {
            return Err(CoreError::ResourcesStillExist(state.resource_count));
        }

        if let Some(active) = self.read_rollback()?.active() {
            return Err(CoreError::RollbackActive(active.to_string()));
        }

        if !self.version_exists(target) {
            return Err(CoreError::VersionNotFound(target.to_string()));
        }

        Ok(())
    }

    /// Reset the rollback directory and fill it from `version`.
    ///
    /// Snapshots written before configurations moved under `tf_configs/`
    /// hold the configuration directly in the version directory; those are
    /// copied without their state file.
    #[tracing::instrument(skip(self))]
    pub fn materialize_rollback(&self, version: &str) -> Result<MaterializedRollback> {
        if !self.version_exists(version) {
            return Err(CoreError::VersionNotFound(version.to_string()));
        }

        let rollback_dir = self.rollback_dir();
        if rollback_dir.exists() {
            std::fs::remove_dir_all(&rollback_dir).map_err(CoreError::io_at(&rollback_dir))?;
        }
        std::fs::create_dir_all(&rollback_dir).map_err(CoreError::io_at(&rollback_dir))?;

        let configs = self.version_configs_dir(version);
        let copy = if configs.is_dir() {
            copy_tree(&configs, &rollback_dir, &ExcludeRules::none())?
        } else {
            tracing::debug!(version, "Snapshot has no {} directory", CONFIGS_DIR);
            let rules = ExcludeRules {
                files: vec![STATE_FILE.to_string()],
                ..Default::default()
            };
            copy_tree(&self.version_dir(version), &rollback_dir, &rules)?
        };

        let meta_target = rollback_dir.join(format!("{}.json", version));
        let meta_copied = match copy_file(&self.meta_path(version), &meta_target) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Could not copy metadata into rollback directory");
                false
            }
        };

        Ok(MaterializedRollback {
            version: version.to_string(),
            copy,
            meta_copied,
        })
    }

    /// Record `version` as the active rollback.
    pub fn mark_rollback_active(&self, version: &str) -> Result<()> {
        self.write_rollback(&RollbackPointer::new(version))
    }

    /// Remove the rollback working directory (if present) and clear the pointer.
    pub fn clear_rollback(&self) -> Result<()> {
        let rollback_dir = self.rollback_dir();
        if rollback_dir.exists() {
            std::fs::remove_dir_all(&rollback_dir).map_err(CoreError::io_at(&rollback_dir))?;
        }
        self.write_rollback(&RollbackPointer::default())
    }
}
