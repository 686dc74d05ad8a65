//! Binary-safe JSON codec for authdb
//!
//! Document databases store JSON, and JSON has no binary type. Cryptographic
//! key material round-tripped through such a store must survive byte-for-byte,
//! with no ambiguity between binary and textual data. This crate provides the
//! lossless transform both directions:
//!
//! - [`Bytes`]: a binary buffer that serializes as the tagged wire form
//!   `{"type":"Buffer","data":"<base64>"}` and deserializes from every
//!   representation older producers emitted (canonical tag, legacy
//!   `{"buffer":true,...}` tag, bare base64 string, numeric byte array).
//!   Any struct built from `Bytes` fields is binary-safe through a plain
//!   `serde_json` round-trip — this is the drop-in serialize/parse hook.
//! - [`Value`]: an in-memory value graph with a first-class `Bytes` node, plus
//!   [`encode`]/[`decode`] converting whole graphs to and from
//!   `serde_json::Value`. This is the full-structure transform for untyped
//!   payloads.
//!
//! ## Wire tag
//!
//! The canonical encoded form of a buffer is
//! `{"type":"Buffer","data":"<base64>"}`. On decode the codec additionally
//! accepts `{"buffer":true,...}`, a payload held in a legacy `value` field,
//! and a tag with no payload at all (which decodes to an empty buffer).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod error;
pub mod value;

pub use buffer::Bytes;
pub use error::{CodecError, Result};
pub use value::{decode, encode, Value};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize any value into its JSON-safe stored form.
///
/// Binary fields typed as [`Bytes`] come out as the canonical buffer tag;
/// everything else is plain JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

/// Deserialize a value from its JSON-safe stored form.
///
/// The inverse of [`to_json`]; [`Bytes`] fields revive from any accepted
/// buffer representation.
pub fn from_json<T: DeserializeOwned>(json: serde_json::Value) -> Result<T> {
    Ok(serde_json::from_value(json)?)
}
