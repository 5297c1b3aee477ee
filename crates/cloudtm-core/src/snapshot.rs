//! Snapshot creation and listing
//!
//! A snapshot is `versions/<id>/` (configuration copy plus an advisory copy
//! of the raw state) together with `meta/<id>.json`.

use crate::copy::{CopyStats, ExcludeRules, copy_file, copy_tree};
use crate::error::{CoreError, Result};
use crate::pointer::{CurrentPointer, read_json, write_json_atomic};
use crate::store::{STORE_DIR, Store};
use crate::summary::ChangeSummary;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Contents of `meta/<id>.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub version: String,
    /// RFC3339, UTC
    pub timestamp: String,
    pub resources: ChangeSummary,
}

impl SnapshotMeta {
    pub fn new(version: impl Into<String>, resources: ChangeSummary) -> Self {
        Self {
            version: version.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            resources,
        }
    }

    /// Numeric ordinal of the version, `0` when it is not of the `v<N>` form.
    pub fn ordinal(&self) -> u64 {
        version_number(&self.version).unwrap_or(0)
    }
}

/// Extract `N` from `v<N>`.
pub fn version_number(version: &str) -> Option<u64> {
    version.strip_prefix('v')?.parse().ok()
}

pub fn format_version(number: u64) -> String {
    format!("v{}", number)
}

/// Validate a user-supplied version id.
pub fn parse_version(version: &str) -> Result<String> {
    match version_number(version) {
        Some(_) => Ok(version.to_string()),
        None => Err(CoreError::InvalidVersion(version.to_string())),
    }
}

/// Outcome of [`Store::create_snapshot`]
#[derive(Debug, Clone)]
pub struct CreatedSnapshot {
    pub meta: SnapshotMeta,
    pub copy: CopyStats,
    /// Whether the raw state file was copied next to the configuration.
    pub state_copied: bool,
}

impl Store {
    /// Allocate the id for the next snapshot.
    ///
    /// Takes the highest ordinal seen in `versions/`, `meta/` and the current
    /// pointer, and the number of existing snapshot directories, so ids keep
    /// increasing when older snapshots are removed by hand.
    pub fn next_version(&self) -> Result<String> {
        let mut highest = 0u64;
        let mut count = 0u64;

        let versions_dir = self.versions_dir();
        if versions_dir.is_dir() {
            for entry in std::fs::read_dir(&versions_dir).map_err(CoreError::io_at(&versions_dir))? {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                count += 1;
                if let Some(n) = version_number(&entry.file_name().to_string_lossy()) {
                    highest = highest.max(n);
                }
            }
        }

        let meta_dir = self.meta_dir();
        if meta_dir.is_dir() {
            for entry in std::fs::read_dir(&meta_dir).map_err(CoreError::io_at(&meta_dir))? {
                let path = entry?.path();
                if path.extension().is_some_and(|e| e == "json")
                    && let Some(n) = path
                        .file_stem()
                        .and_then(|s| version_number(&s.to_string_lossy()))
                {
                    highest = highest.max(n);
                }
            }
        }

        if let Ok(current) = self.read_current()
            && let Some(n) = current.version().and_then(version_number)
        {
            highest = highest.max(n);
        }

        Ok(format_version(highest.max(count) + 1))
    }

    /// Capture the project into a new snapshot and make it current.
    ///
    /// Copies the configuration tree (minus `rules`) into
    /// `versions/<id>/tf_configs`, keeps a copy of the live state file when
    /// there is one, writes the metadata and points `current.json` at it.
    #[tracing::instrument(skip(self, rules), fields(project = %self.project_root().display()))]
    pub fn create_snapshot(
        &self,
        resources: ChangeSummary,
        rules: &ExcludeRules,
    ) -> Result<CreatedSnapshot> {
        self.require_initialized()?;

        // the store itself lives inside the project and is never captured
        let mut rules = rules.clone();
        rules.merge(&ExcludeRules {
            dirs: vec![STORE_DIR.to_string()],
            ..Default::default()
        });

        let version = self.next_version()?;
        let configs_dir = self.version_configs_dir(&version);
        let copy = copy_tree(self.project_root(), &configs_dir, &rules)?;

        let state_path = self.state_path();
        let state_copied = if state_path.exists() {
            match copy_file(&state_path, &self.version_state_path(&version)) {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not copy state file into snapshot");
                    false
                }
            }
        } else {
            false
        };

        let meta = SnapshotMeta::new(&version, resources);
        write_json_atomic(&self.meta_path(&version), &meta)?;
        self.write_current(&CurrentPointer::new(&version, true))?;

        tracing::info!(version = %version, files = copy.files, "Created snapshot");
        Ok(CreatedSnapshot {
            meta,
            copy,
            state_copied,
        })
    }

    /// Ids that are not of the form `v<N>` never exist.
    pub fn version_exists(&self, version: &str) -> bool {
        parse_version(version).is_ok() && self.version_dir(version).is_dir()
    }

    pub fn read_meta(&self, version: &str) -> Result<SnapshotMeta> {
        read_json(&self.meta_path(version))
    }

    /// All readable snapshot metadata, newest ordinal first.
    ///
    /// Entries that cannot be read or decoded are skipped.
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotMeta>> {
        let meta_dir = self.meta_dir();
        let mut snapshots = Vec::new();

        for entry in std::fs::read_dir(&meta_dir).map_err(CoreError::io_at(&meta_dir))? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(true)
                || !path.extension().is_some_and(|e| e == "json")
            {
                continue;
            }

            match read_json::<SnapshotMeta>(&path) {
                Ok(meta) => snapshots.push(meta),
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "Skipping metadata"),
            }
        }

        sort_newest_first(&mut snapshots);
        Ok(snapshots)
    }
}

/// Sort by numeric ordinal, descending.
pub fn sort_newest_first(snapshots: &mut [SnapshotMeta]) {
    snapshots.sort_by(|a, b| b.ordinal().cmp(&a.ordinal()));
}
