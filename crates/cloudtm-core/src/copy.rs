//! Recursive directory copy with exclusion rules
//!
//! Used to capture the configuration tree into a snapshot and to materialize
//! a snapshot into the rollback working directory.

use crate::error::{CoreError, Result};
use glob::Pattern;
use std::path::{Component, Path};
use walkdir::{DirEntry, WalkDir};

/// Paths to leave out of a copy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeRules {
    /// Matched against the source-relative path, exactly or as a prefix.
    /// A matching directory is pruned with its whole subtree.
    pub dirs: Vec<String>,
    /// Exact file names (basename only).
    pub files: Vec<String>,
    /// Glob patterns matched against the file name.
    pub patterns: Vec<String>,
}

impl ExcludeRules {
    /// Copy everything.
    pub fn none() -> Self {
        Self::default()
    }

    /// Rules used when capturing a project's configuration into a snapshot.
    pub fn snapshot_defaults() -> Self {
        Self {
            dirs: vec![".cloudtm".into(), ".terraform".into(), ".git".into()],
            files: vec![
                "terraform.tfstate".into(),
                "terraform.tfstate.backup".into(),
            ],
            patterns: vec!["*.tfstate".into(), "*.tfstate.*".into(), "*.tfplan".into()],
        }
    }

    /// Append the entries of `other` that are not already present.
    pub fn merge(&mut self, other: &ExcludeRules) {
        fn extend_unique(into: &mut Vec<String>, from: &[String]) {
            for item in from {
                if !into.contains(item) {
                    into.push(item.clone());
                }
            }
        }
        extend_unique(&mut self.dirs, &other.dirs);
        extend_unique(&mut self.files, &other.files);
        extend_unique(&mut self.patterns, &other.patterns);
    }

    fn compile(&self) -> Result<CompiledRules<'_>> {
        let patterns = self
            .patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| CoreError::InvalidPattern {
                    pattern: p.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledRules {
            rules: self,
            patterns,
        })
    }
}

struct CompiledRules<'a> {
    rules: &'a ExcludeRules,
    patterns: Vec<Pattern>,
}

impl CompiledRules<'_> {
    fn excludes(&self, relative: &str, file_name: &str, is_dir: bool) -> bool {
        if self
            .rules
            .dirs
            .iter()
            .any(|d| relative == d || relative.starts_with(d.as_str()))
        {
            return true;
        }

        if is_dir {
            return false;
        }

        self.rules.files.iter().any(|f| f == file_name)
            || self.patterns.iter().any(|p| p.matches(file_name))
    }
}

/// Counters reported by [`copy_tree`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub dirs: usize,
    pub skipped: usize,
}

/// Source-relative path with `/` separators, the form exclusion rules use.
fn relative_key(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Copy `src` into `dst`, applying `rules`.
///
/// Mode bits are carried over for files and directories. The copy stops at
/// the first I/O error; whatever was already written stays in place.
#[tracing::instrument(skip_all, fields(src = %src.display(), dst = %dst.display()))]
pub fn copy_tree(src: &Path, dst: &Path, rules: &ExcludeRules) -> Result<CopyStats> {
    let compiled = rules.compile()?;
    let mut stats = CopyStats::default();
    let mut skipped = 0usize;

    let root_meta = std::fs::metadata(src).map_err(CoreError::io_at(src))?;
    std::fs::create_dir_all(dst).map_err(CoreError::io_at(dst))?;

    // Directory permissions are applied last so read-only sources don't block
    // writing their children.
    let mut dir_permissions = vec![(dst.to_path_buf(), root_meta.permissions())];

    let keep = |entry: &DirEntry| {
        let relative = match entry.path().strip_prefix(src) {
            Ok(rel) => relative_key(rel),
            Err(_) => return true,
        };
        let file_name = entry.file_name().to_string_lossy();
        let excluded = compiled.excludes(&relative, &file_name, entry.file_type().is_dir());
        if excluded {
            tracing::debug!(path = %relative, "Excluded from copy");
            skipped += 1;
        }
        !excluded
    };

    for entry in WalkDir::new(src).min_depth(1).into_iter().filter_entry(keep) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| CoreError::Io(std::io::Error::other(e)))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(CoreError::io_at(&target))?;
            let meta = entry.metadata()?;
            dir_permissions.push((target, meta.permissions()));
            stats.dirs += 1;
        } else {
            copy_file(entry.path(), &target)?;
            stats.files += 1;
        }
    }

    for (dir, permissions) in dir_permissions.into_iter().rev() {
        std::fs::set_permissions(&dir, permissions).map_err(CoreError::io_at(&dir))?;
    }

    stats.skipped = skipped;
    tracing::debug!(
        files = stats.files,
        dirs = stats.dirs,
        skipped = stats.skipped,
        "Copied directory tree"
    );
    Ok(stats)
}

/// Copy a single file, creating parent directories and keeping its mode bits.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(CoreError::io_at(parent))?;
    }
    std::fs::copy(src, dst).map_err(CoreError::io_at(src))
}
