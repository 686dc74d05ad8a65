//! The `Bytes` buffer type and its tagged serde representation
//!
//! `Bytes` is the binary leaf of every persisted value graph. Its serde
//! implementation is the replacer/reviver pair of the codec: serializing
//! always emits the canonical `{"type":"Buffer","data":"<base64>"}` tag,
//! and deserializing accepts every historical shape of that tag.
//!
//! Accepted decode inputs:
//! - `{"type":"Buffer","data":"<base64>"}` (canonical)
//! - `{"buffer":true,"data":...}` (legacy tag form)
//! - payload in a `value` field instead of `data` (legacy field name)
//! - a tag with no payload at all (decodes to an empty buffer)
//! - a bare base64 string
//! - a numeric byte array `[1,2,3]`

use std::fmt;
use std::ops::Deref;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as Json};

use crate::error::{CodecError, Result};

/// Tag field marking an object as a buffer (canonical form)
const TAG_TYPE: &str = "type";
/// Tag value of the canonical form
const TAG_BUFFER: &str = "Buffer";
/// Tag field marking an object as a buffer (legacy boolean form)
const TAG_LEGACY: &str = "buffer";
/// Payload field of a buffer tag
const FIELD_DATA: &str = "data";
/// Legacy payload field of a buffer tag
const FIELD_VALUE: &str = "value";

/// An owned binary buffer with a lossless JSON representation
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    /// Create a buffer from raw bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Create an empty buffer
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Length of the buffer in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the raw bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Consume the buffer, returning the raw bytes
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Standard base64 encoding of the buffer contents
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Decode a buffer from standard base64
    pub fn from_base64(encoded: &str) -> Result<Self> {
        Ok(Self(STANDARD.decode(encoded)?))
    }

    /// Decode a buffer from any accepted JSON representation.
    ///
    /// This is the reviver: it understands the canonical tag, the legacy
    /// tag and payload-field names, bare base64 strings, and numeric byte
    /// arrays. A tag without a payload decodes to an empty buffer.
    pub fn from_tagged_json(json: &Json) -> Result<Self> {
        match json {
            Json::String(s) => Self::from_base64(s),
            Json::Array(items) => bytes_from_array(items),
            Json::Object(map) => {
                if !is_buffer_tag(map) {
                    return Err(CodecError::NotABuffer("object without a buffer tag"));
                }
                match tag_payload(map) {
                    None => Ok(Self::empty()),
                    Some(Json::String(s)) => Self::from_base64(s),
                    Some(Json::Array(items)) => bytes_from_array(items),
                    Some(_) => Err(CodecError::NotABuffer("unsupported tag payload")),
                }
            }
            Json::Null => Err(CodecError::NotABuffer("null")),
            Json::Bool(_) => Err(CodecError::NotABuffer("boolean")),
            Json::Number(_) => Err(CodecError::NotABuffer("number")),
        }
    }
}

/// Whether a JSON object carries a buffer tag (canonical or legacy form)
pub(crate) fn is_buffer_tag(map: &Map<String, Json>) -> bool {
    map.get(TAG_TYPE).and_then(Json::as_str) == Some(TAG_BUFFER)
        || map.get(TAG_LEGACY).and_then(Json::as_bool) == Some(true)
}

/// The payload of a buffer tag: `data` first, legacy `value` as fallback.
/// Explicit nulls count as absent.
fn tag_payload(map: &Map<String, Json>) -> Option<&Json> {
    map.get(FIELD_DATA)
        .filter(|v| !v.is_null())
        .or_else(|| map.get(FIELD_VALUE).filter(|v| !v.is_null()))
}

fn bytes_from_array(items: &[Json]) -> Result<Bytes> {
    let mut bytes = Vec::with_capacity(items.len());
    for item in items {
        let byte = item
            .as_u64()
            .filter(|b| *b <= u8::MAX as u64)
            .ok_or_else(|| CodecError::ByteOutOfRange(item.to_string()))?;
        bytes.push(byte as u8);
    }
    Ok(Bytes(bytes))
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes({} bytes)", self.0.len())
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Bytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Bytes {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(TAG_TYPE, TAG_BUFFER)?;
        map.serialize_entry(FIELD_DATA, &self.to_base64())?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = Json::deserialize(deserializer)?;
        Bytes::from_tagged_json(&json).map_err(D::Error::custom)
    }
}
