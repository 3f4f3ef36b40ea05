//! Terraform layer error types

use thiserror::Error;

/// Terraform synthesis and CLI errors
#[derive(Error, Debug)]
pub enum TerraformError {
    #[error("terraform binary not found on PATH")]
    BinaryNotFound,

    #[error("terraform {command} exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("terraform {command} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("Construct address already in use: {0}")]
    AddressCollision(String),

    #[error("terraform output missing key: {0}")]
    MissingOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TerraformError {
    /// Timeouts are retryable; everything else is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TerraformError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, TerraformError>;
