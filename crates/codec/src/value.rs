//! In-memory value graphs and the full-structure transform
//!
//! [`Value`] is the decoded shape of a stored document value: JSON scalars,
//! ordered sequences, string-keyed mappings, and real binary buffers.
//! [`encode`] and [`decode`] convert between it and `serde_json::Value`,
//! tagging buffers on the way out and reviving them on the way in.
//!
//! ## Round-trip contract
//!
//! `decode(encode(v)) == v` for every graph reachable from these variants,
//! including buffers of length 0, 1, and multiple megabytes, at any nesting
//! depth. The one caveat (shared with the original wire format): an `Object`
//! deliberately shaped like a buffer tag is indistinguishable from a real
//! buffer and will decode as one.

use std::collections::HashMap;

use serde_json::{Map, Value as Json};

use crate::buffer::{is_buffer_tag, Bytes};
use crate::error::Result;

/// A decoded value graph with first-class binary buffers
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Binary buffer
    Bytes(Bytes),
    /// Ordered sequence of values
    Array(Vec<Value>),
    /// String-keyed mapping
    Object(HashMap<String, Value>),
}

impl Value {
    /// Name of the variant, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
        }
    }

    /// Whether this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an `Int`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as &str if this is a `String`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as a byte slice if this is a `Bytes`
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Get as a slice of values if this is an `Array`
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as a mapping if this is an `Object`
    pub fn as_object(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Look up a field if this is an `Object`
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.as_object().and_then(|o| o.get(field))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Bytes::new(b))
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(o: HashMap<String, Value>) -> Self {
        Value::Object(o)
    }
}

/// Encode a value graph into its JSON-safe stored form.
///
/// Buffers become the canonical tag. An `Object` that already looks like a
/// buffer tag (e.g. re-read from an older producer that stored numeric byte
/// arrays) is normalized to the canonical base64 form; a tag whose payload
/// cannot be interpreted passes through unchanged.
pub fn encode(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(b) => buffer_tag(b),
        Value::Array(items) => Json::Array(items.iter().map(encode).collect()),
        Value::Object(map) => {
            if let Some(bytes) = tagged_buffer_payload(map) {
                return buffer_tag(&bytes);
            }
            Json::Object(map.iter().map(|(k, v)| (k.clone(), encode(v))).collect())
        }
    }
}

/// Decode a JSON-safe stored form back into a value graph.
///
/// Objects carrying a buffer tag (either accepted form) become `Bytes`;
/// everything else passes through, recursing into arrays and objects.
/// Numbers decode as `Int` when they fit in i64 and `Float` otherwise.
pub fn decode(json: Json) -> Result<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(0.0)),
        },
        Json::String(s) => Value::String(s),
        Json::Array(items) => {
            Value::Array(items.into_iter().map(decode).collect::<Result<_>>()?)
        }
        Json::Object(map) => {
            if is_buffer_tag(&map) {
                Value::Bytes(Bytes::from_tagged_json(&Json::Object(map))?)
            } else {
                Value::Object(
                    map.into_iter()
                        .map(|(k, v)| Ok((k, decode(v)?)))
                        .collect::<Result<_>>()?,
                )
            }
        }
    })
}

fn buffer_tag(bytes: &Bytes) -> Json {
    let mut map = Map::with_capacity(2);
    map.insert("type".to_string(), Json::String("Buffer".to_string()));
    map.insert("data".to_string(), Json::String(bytes.to_base64()));
    Json::Object(map)
}

/// Interpret a `Value::Object` as a buffer tag, if it is shaped like one.
///
/// Returns the payload bytes when the object carries a tag with a usable
/// payload (base64 string, in-range numeric array, a real `Bytes` node, or
/// no payload at all, which is an empty buffer).
fn tagged_buffer_payload(map: &HashMap<String, Value>) -> Option<Bytes> {
    let tagged = map.get("type").and_then(Value::as_str) == Some("Buffer")
        || map.get("buffer").and_then(Value::as_bool) == Some(true);
    if !tagged {
        return None;
    }
    let payload = map
        .get("data")
        .filter(|v| !v.is_null())
        .or_else(|| map.get("value").filter(|v| !v.is_null()));
    match payload {
        None => Some(Bytes::empty()),
        Some(Value::Bytes(b)) => Some(b.clone()),
        Some(Value::String(s)) => Bytes::from_base64(s).ok(),
        Some(Value::Array(items)) => {
            let mut bytes = Vec::with_capacity(items.len());
            for item in items {
                match item.as_int() {
                    Some(b) if (0..=255).contains(&b) => bytes.push(b as u8),
                    _ => return None,
                }
            }
            Some(Bytes::new(bytes))
        }
        Some(_) => None,
    }
}
