//! Backend error types

use thiserror::Error;

/// Result type alias for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Errors surfaced by document backends
#[derive(Debug, Error)]
pub enum BackendError {
    /// Underlying I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be serialized or parsed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A key or table name the backend cannot address safely
    #[error("invalid document key: {0}")]
    InvalidKey(String),

    /// The backend is unreachable or refused the operation
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
