//! Provider layer error types

use cloudplane_core::ResourceKind;
use thiserror::Error;

/// Provider abstraction errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Provider {provider_type} does not support resource kind {kind}")]
    UnsupportedResource {
        kind: ResourceKind,
        provider_type: String,
    },

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider store is frozen for the current run; cannot register {0}")]
    StoreFrozen(String),

    /// Live-query failure against the vendor API. Retryable by the caller;
    /// the service itself never retries.
    #[error("Live query for {kind} failed: {reason}")]
    ProviderQueryFailed { kind: ResourceKind, reason: String },

    /// The vendor returned a row the service cannot make sense of. The raw
    /// payload is carried for debugging.
    #[error("Provider returned malformed data for {kind}: {raw}")]
    ProviderDataCorrupt { kind: ResourceKind, raw: String },

    #[error("Import mapping incomplete; no external id for: {}", missing.join(", "))]
    IncompleteImportMapping { missing: Vec<String> },

    #[error("Invalid credentials for provider type {provider_type}: {}", violations.join("; "))]
    CredentialsInvalid {
        provider_type: String,
        violations: Vec<String>,
    },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Core error: {0}")]
    Core(#[from] cloudplane_core::CoreError),

    #[error("Terraform error: {0}")]
    Terraform(#[from] cloudplane_terraform::TerraformError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Whether a caller may reasonably retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            CloudError::ProviderQueryFailed { .. } | CloudError::Timeout(_) => true,
            CloudError::Terraform(e) => e.is_retryable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
