//! Document backend abstraction for authdb
//!
//! The store core talks to whatever database holds its documents only
//! through the [`DocumentBackend`] trait: get a document by key, upsert one,
//! delete one, and bulk-delete by session tag. Concrete adapters for
//! document databases implement this trait; the store never names a driver.
//!
//! This crate ships two adapters — [`MemoryBackend`] and [`FileBackend`] —
//! plus [`Retrying`], a decorator adding configurable retry to any backend.
//!
//! Backends may be eventually consistent and are not required to provide
//! atomic read-modify-write; the store layers per-key locking above this
//! trait for exactly that reason.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod file;
pub mod memory;
pub mod retry;

pub use document::Document;
pub use error::{BackendError, BackendResult};
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use retry::{Retrying, RetryPolicy};

use async_trait::async_trait;

/// Uniform contract over a pluggable document store
///
/// `table` addresses the physical container (collection, table, directory)
/// within the backend; `key` is the opaque derived record key. Documents
/// are stored whole; `merge` on [`put`](DocumentBackend::put) asks the
/// backend to preserve existing fields that the new document leaves unset.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Fetch a document by key. Absence is `Ok(None)`, never an error.
    async fn get(&self, table: &str, key: &str) -> BackendResult<Option<Document>>;

    /// Insert or replace the document under its key.
    ///
    /// With `merge`, fields not set on `document` (currently the creation
    /// timestamp) are preserved from any existing document.
    async fn put(&self, table: &str, document: Document, merge: bool) -> BackendResult<()>;

    /// Delete a document by key. Deleting an absent document succeeds.
    async fn delete(&self, table: &str, key: &str) -> BackendResult<()>;

    /// Bulk-delete every document whose `session` field equals `session`,
    /// optionally keeping the document stored under `exclude_key`.
    ///
    /// Best-effort: individual documents that fail to delete are skipped
    /// (and logged), never aborting the sweep.
    async fn delete_where_session(
        &self,
        table: &str,
        session: &str,
        exclude_key: Option<&str>,
    ) -> BackendResult<()>;
}
