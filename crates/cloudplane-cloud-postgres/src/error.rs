//! PostgreSQL provider error types

use thiserror::Error;

/// psql wrapper errors
#[derive(Error, Debug)]
pub enum PgError {
    #[error("psql is not installed or not on PATH")]
    PsqlNotFound,

    #[error("psql exited with an error: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PgError>;
