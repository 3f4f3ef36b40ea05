//! Graph and pipeline error types

use thiserror::Error;

/// Graph construction and pipeline errors
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Cyclic dependency: {}", path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    #[error("{from} references {to}, which is not in the graph")]
    MissingDependency { from: String, to: String },

    #[error("{resource} has no output named {output}")]
    UnknownOutput { resource: String, output: String },

    #[error("Duplicate descriptor name: {0}")]
    DuplicateNode(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("Core error: {0}")]
    Core(#[from] cloudplane_core::CoreError),

    #[error("Cloud error: {0}")]
    Cloud(#[from] cloudplane_cloud::CloudError),

    #[error("Terraform error: {0}")]
    Terraform(#[from] cloudplane_terraform::TerraformError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GraphError>;
