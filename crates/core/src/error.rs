//! Error types for the core domain model

use thiserror::Error;

/// Result type alias for record decode operations
pub type Result<T> = std::result::Result<T, RecordError>;

/// Errors produced while decoding keyed records
#[derive(Debug, Error)]
pub enum RecordError {
    /// The stored payload could not be decoded
    #[error("codec error: {0}")]
    Codec(#[from] authdb_codec::CodecError),

    /// A record-kind string outside the closed catalog
    #[error("unknown record kind: {0}")]
    UnknownKind(String),

    /// The root credential record is not a keyed record
    #[error("the creds record has no keyed payload; decode it as AuthCreds")]
    CredsNotKeyed,
}

impl From<serde_json::Error> for RecordError {
    fn from(e: serde_json::Error) -> Self {
        RecordError::Codec(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_display() {
        let err = RecordError::UnknownKind("mystery".to_string());
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn test_from_serde_json() {
        let json_err = serde_json::from_str::<bool>("3").unwrap_err();
        let err: RecordError = json_err.into();
        assert!(matches!(err, RecordError::Codec(_)));
    }
}
