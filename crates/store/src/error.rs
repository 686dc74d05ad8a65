//! Store error types
//!
//! Read paths do not produce errors at all: per the store-wide policy,
//! decode and backend failures on reads collapse into absent values. The
//! errors below surface from writes, deletes, and diagnostics.

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected an operation (after adapter-level retries)
    #[error("backend error: {0}")]
    Backend(#[from] authdb_backend::BackendError),

    /// A value could not be encoded for storage
    #[error("codec error: {0}")]
    Codec(#[from] authdb_codec::CodecError),

    /// A record payload could not be prepared or interpreted
    #[error("record error: {0}")]
    Record(#[from] authdb_core::RecordError),

    /// A batch `set` ran to completion with some entries failing.
    ///
    /// Entries fail independently; the successful ones are applied.
    /// Re-issuing the same batch is safe — writes and deletes of the same
    /// key converge.
    #[error("batch set completed with {failed} of {total} entries failed")]
    Batch {
        /// Number of entries that failed
        failed: usize,
        /// Number of entries in the batch
        total: usize,
    },
}
