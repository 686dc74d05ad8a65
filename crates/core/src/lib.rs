//! Core types for authdb
//!
//! This crate defines the domain model shared by every other crate:
//! - RecordKind: the closed catalog of persisted record kinds
//! - KeyRecord: tagged union of keyed record payloads, with per-kind decode
//! - AuthCreds and friends: the typed credential model, wire-compatible with
//!   documents written by earlier producers (camelCase field names, tagged
//!   buffers)
//! - Credential bootstrap: deterministic default construction of a fresh
//!   root credential record
//! - Key derivation: flattening (session, kind, id) into backend-safe keys
//! - StoreConfig: store configuration with its defaults

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod creds;
pub mod error;
pub mod key;
pub mod kinds;

mod bootstrap;

pub use config::StoreConfig;
pub use creds::{
    Account, AccountSettings, AppDataSync, AuthCreds, Contact, DisappearingMode, Fingerprint,
    IndexValue, KeyPair, LtHashState, ProcessedHistoryMessage, ProtocolAddress,
    RegistrationMethod, RegistrationOptions, SignalIdentity, SignedKeyPair,
};
pub use error::{RecordError, Result};
pub use key::{derive_key, root_key, sanitize_component};
pub use kinds::{KeyRecord, RecordKind};

// The codec is part of the public contract of this crate's types.
pub use authdb_codec::{Bytes, CodecError, Value};
