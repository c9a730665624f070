//! Session Gate error types.
//!
//! The bootstrap, guard and version cache never surface these to a caller
//! navigating the site; they exist so that every failure is a closed, typed
//! value that the degrading code paths can match on exhaustively.

use thiserror::Error;

/// Failure of an outbound HTTP call to the identity backend or release feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The backend rejected the caller's credentials (401/403).
    #[error("Not signed in")]
    Unauthorized,

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Request timed out")]
    Timeout,

    /// The response arrived but its body did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },
}

impl ClientError {
    /// Short, bounded label for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Unauthorized => "unauthorized",
            ClientError::NetworkFailure(_) => "network",
            ClientError::Timeout => "timeout",
            ClientError::Malformed(_) => "malformed",
            ClientError::UnexpectedStatus { .. } => "status",
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Malformed(err.to_string())
        } else {
            ClientError::NetworkFailure(err.to_string())
        }
    }
}

/// Failure of the persisted key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(String),

    #[error("Invalid store key: {0}")]
    InvalidKey(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Process-level errors raised while starting or serving the gate.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to bind listener: {0}")]
    Bind(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Server error: {0}")]
    Serve(String),
}
