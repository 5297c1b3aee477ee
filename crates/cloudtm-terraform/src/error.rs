//! Terraform runner error types

use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerraformError {
    #[error(
        "{program} not found in PATH.\n\
        Please install Terraform: https://developer.hashicorp.com/terraform/downloads"
    )]
    NotFound { program: String },

    #[error("Failed to start '{program} {command}': {source}")]
    Spawn {
        program: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("terraform {command} failed: {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TerraformError>;
