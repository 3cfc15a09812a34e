//! Error types for the relay client

use thiserror::Error;

/// Relay error types
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("upstream returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("failed to reach upstream: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream error: {0}")]
    Backend(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RelayError {
    /// True for caller-initiated teardown, which is not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RelayError::Cancelled)
    }
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;
