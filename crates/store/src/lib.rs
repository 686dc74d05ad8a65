//! The authdb credential store
//!
//! This crate orchestrates the other authdb components into the public
//! store API. A [`Session`] is opened against any
//! [`DocumentBackend`](authdb_backend::DocumentBackend) and owns the
//! in-memory root credential record; its [`KeyStore`] view reads and writes
//! keyed protocol records.
//!
//! Data flow per operation: derive the backend key, acquire that key's
//! lock, perform the backend I/O, run the payload through the binary-safe
//! codec, return. Operations on the same key are totally ordered;
//! operations on different keys proceed concurrently.
//!
//! # Example
//!
//! ```ignore
//! use authdb_store::{KeyDataSet, Session, StoreConfig};
//! use authdb_backend::MemoryBackend;
//! use authdb_core::{KeyRecord, RecordKind};
//!
//! let mut session = Session::open(MemoryBackend::new(), StoreConfig::for_session("s1")).await?;
//! session.save_creds().await?;
//!
//! let batch = KeyDataSet::new().put("addr@host", KeyRecord::Session(b"ratchet"[..].into()));
//! session.keys().set(batch).await?;
//! let records = session.keys().get(RecordKind::Session, &["addr@host"]).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod keystore;
pub mod session;

pub use error::{StoreError, StoreResult};
pub use keystore::{KeyDataSet, KeyStore};
pub use session::Session;

// The types callers hold when using the store.
pub use authdb_backend::{Document, DocumentBackend, FileBackend, MemoryBackend};
pub use authdb_core::{AuthCreds, Bytes, KeyRecord, RecordKind, StoreConfig};
