//! cloudtm core
//!
//! Everything cloudtm keeps on disk lives under `.cloudtm/` next to the
//! Terraform configuration:
//!
//! ```text
//! .cloudtm/
//! ├── current.json          {current, status}
//! ├── rollback.json         {rollback}
//! ├── config.json           optional settings
//! ├── meta/<id>.json        {version, timestamp, resources}
//! ├── versions/<id>/
//! │   ├── tf_configs/       configuration captured at apply time
//! │   └── terraform.tfstate state captured at apply time
//! └── rollback/             working copy of the active rollback
//! ```
//!
//! This crate owns that layout, the directory copier, the pointer documents,
//! the state inspector and the change-summary scraper. Running Terraform is
//! left to `cloudtm-terraform`.

pub mod copy;
pub mod error;
pub mod pointer;
pub mod rollback;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod summary;

// Re-exports
pub use copy::{CopyStats, ExcludeRules, copy_file, copy_tree};
pub use error::{CoreError, Result};
pub use pointer::{CurrentPointer, RollbackPointer};
pub use rollback::MaterializedRollback;
pub use snapshot::{
    CreatedSnapshot, SnapshotMeta, format_version, parse_version, sort_newest_first,
    version_number,
};
pub use state::{STATE_FILE, StateSummary, inspect_state, is_state_empty};
pub use store::{InitReport, STORE_DIR, Store};
pub use summary::{ChangeSummary, parse_change_summary, parse_change_summary_bytes};
