//! Error types for the codec
//!
//! Decode failures are real errors here; whether a failed decode surfaces to
//! a caller or collapses into an absent value is the store layer's policy,
//! not the codec's.

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors produced while encoding or decoding buffer-tagged JSON
#[derive(Debug, Error)]
pub enum CodecError {
    /// A buffer payload held a base64 string that does not parse
    #[error("invalid base64 in buffer payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A numeric buffer payload held a value outside 0..=255
    #[error("buffer byte out of range: {0}")]
    ByteOutOfRange(String),

    /// A value was handed to the buffer decoder that carries no buffer tag
    #[error("value is not a decodable buffer: {0}")]
    NotABuffer(&'static str),

    /// Serialization to or from `serde_json` failed
    #[error("JSON conversion error: {0}")]
    Json(#[from] serde_json::Error),
}
