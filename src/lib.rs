//! authdb - pluggable credential/session persistence for stateful
//! messaging clients
//!
//! authdb stores a messaging session's cryptographic key material and
//! protocol state in any JSON-oriented document database, losslessly and
//! without read-modify-write races. It is organized as a small workspace:
//! a binary-safe codec, a key namespacer, a per-key lock manager, a
//! pluggable document-backend contract, and the credential store that
//! orchestrates them.
//!
//! # Quick Start
//!
//! ```ignore
//! use authdb::{KeyDataSet, KeyRecord, MemoryBackend, RecordKind, Session, StoreConfig};
//!
//! // Open (or bootstrap) a session against a backend.
//! let mut session = Session::open(MemoryBackend::new(), StoreConfig::for_session("s1")).await?;
//! session.save_creds().await?;
//!
//! // Keyed protocol records: batch writes, explicit absent markers delete.
//! let batch = KeyDataSet::new().put("addr@host", KeyRecord::Session(b"ratchet"[..].into()));
//! session.keys().set(batch).await?;
//! let records = session.keys().get(RecordKind::Session, &["addr@host"]).await;
//! ```
//!
//! # Architecture
//!
//! All persistence goes through the [`DocumentBackend`] contract; the store
//! never names a concrete database. Operations on one derived key are
//! totally ordered by a per-key FIFO lock; operations on different keys
//! proceed concurrently.

// Re-export the public API from the store crate.
pub use authdb_store::*;

// The remaining building blocks, for callers implementing their own
// backends or working with raw value graphs.
pub use authdb_backend::{BackendError, BackendResult, Retrying, RetryPolicy};
pub use authdb_codec::{decode, encode, CodecError, Value};
pub use authdb_core::{
    derive_key, root_key, AppDataSync, KeyPair, LtHashState, RecordError, SignedKeyPair,
};
pub use authdb_lock::KeyedLocks;
