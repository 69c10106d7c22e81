//! Error types for backboard-core

use thiserror::Error;

/// Main error type for the backboard-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The request never produced an HTTP response (connect, timeout, body read)
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// A workspace path was rejected by the traversal checks
    #[error("unsafe path: {0}")]
    UnsafePath(String),

    /// A tool result was missing required fields
    #[error("invalid tool result: {0}")]
    InvalidToolResult(String),
}

impl Error {
    /// True when the backend reported 404 for the configured client.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Backend { status: 404, .. })
    }
}

/// Result type alias for backboard-core
pub type Result<T> = std::result::Result<T, Error>;
