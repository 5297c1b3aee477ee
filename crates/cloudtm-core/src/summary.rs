//! Change-summary extraction from Terraform output
//!
//! Terraform reports the outcome of an apply as a human-readable line such as
//! `Apply complete! Resources: 1 added, 0 changed, 0 destroyed.`. This module
//! turns captured output into a [`ChangeSummary`] without touching any state.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static SUMMARY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Resources: (\d+) added, (\d+) changed, (\d+) destroyed")
        .expect("summary pattern is a valid regex")
});

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("ansi pattern is a valid regex")
});

/// Resource change counts reported by an apply.
///
/// Counts are kept as strings because that is how they are persisted in
/// snapshot metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub added: String,
    pub changed: String,
    pub destroyed: String,
}

impl ChangeSummary {
    pub fn new(
        added: impl Into<String>,
        changed: impl Into<String>,
        destroyed: impl Into<String>,
    ) -> Self {
        Self {
            added: added.into(),
            changed: changed.into(),
            destroyed: destroyed.into(),
        }
    }

    /// Whether any of the counts is non-zero.
    ///
    /// A count that is not a number is treated as a change.
    pub fn has_changes(&self) -> bool {
        [&self.added, &self.changed, &self.destroyed]
            .iter()
            .any(|count| count.trim().parse::<u64>().map_or(true, |n| n != 0))
    }
}

impl std::fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} added, {} changed, {} destroyed",
            self.added, self.changed, self.destroyed
        )
    }
}

/// Extract the change summary from captured Terraform output.
///
/// Colour escapes are stripped first. When the output holds several summary
/// lines the last one is returned. `None` means the summary could not be
/// found, not that nothing changed.
pub fn parse_change_summary(output: &str) -> Option<ChangeSummary> {
    let plain = ANSI_ESCAPE.replace_all(output, "");
    let caps = SUMMARY_PATTERN.captures_iter(&plain).last()?;
    Some(ChangeSummary::new(&caps[1], &caps[2], &caps[3]))
}

/// Byte-oriented wrapper around [`parse_change_summary`] for raw process output.
pub fn parse_change_summary_bytes(output: &[u8]) -> Option<ChangeSummary> {
    parse_change_summary(&String::from_utf8_lossy(output))
}
