//! Core error types

use thiserror::Error;

/// A single schema violation for one input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Field the violation applies to
    pub field: String,

    /// What is wrong with it
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Core errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown resource kind: {0}")]
    UnknownKind(String),

    /// Every offending field is collected before this is returned, so the
    /// caller sees all problems at once.
    #[error("Schema violations for {kind}/{name}: {}", violations.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("; "))]
    SchemaViolation {
        kind: String,
        name: String,
        violations: Vec<Violation>,
    },

    #[error("Invalid reference expression: {0}")]
    InvalidReference(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
