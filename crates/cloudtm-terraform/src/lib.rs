//! Terraform subprocess runner for cloudtm
//!
//! Terraform is treated as an opaque program on `PATH`: cloudtm only starts
//! `init`, `apply` and `destroy`, streams their output to the terminal and
//! checks the exit status.

pub mod error;
pub mod terraform;

// Re-exports
pub use error::{Result, TerraformError};
pub use terraform::{
    AUTO_APPROVE_FLAG, Approval, CapturedOutput, DEFAULT_PROGRAM, Terraform, has_auto_approve,
};
