//! DigitalOcean provider error types

use thiserror::Error;

/// DigitalOcean API errors
#[derive(Error, Debug)]
pub enum DoError {
    #[error("DigitalOcean rejected the API token")]
    Unauthorized,

    #[error("DigitalOcean API error: {0}")]
    ApiError(String),

    #[error("Malformed API response: {0}")]
    MalformedRow(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DoError>;
