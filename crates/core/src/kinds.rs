//! The closed catalog of record kinds and their typed payloads
//!
//! Record kinds are a closed set: adding one means extending [`RecordKind`],
//! [`KeyRecord`], and the decode dispatch below, in one place. Kind-specific
//! behavior on the read path is expressed as a per-kind decode arm rather
//! than string comparisons scattered through the store; only
//! `AppStateSyncKey` carries an extra post-decode reconstruction step
//! ([`AppDataSync::from_value`]).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::creds::{AppDataSync, KeyPair, LtHashState};
use crate::error::{RecordError, Result};
use authdb_codec::Bytes;

/// The catalog of persisted record kinds.
///
/// String forms are the wire catalog and appear verbatim inside derived
/// backend keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    /// A Signal session ratchet with one remote address
    Session,
    /// A one-time pre-key pair, identified by key index
    PreKey,
    /// A group sender key
    SenderKey,
    /// App-state synchronization key material
    AppStateSyncKey,
    /// App-state synchronization hash state
    AppStateSyncVersion,
    /// Per-group memory of which participants hold our sender key
    SenderKeyMemory,
    /// The distinguished root credential record
    Creds,
}

impl RecordKind {
    /// All kinds, in catalog order
    pub const ALL: [RecordKind; 7] = [
        RecordKind::Session,
        RecordKind::PreKey,
        RecordKind::SenderKey,
        RecordKind::AppStateSyncKey,
        RecordKind::AppStateSyncVersion,
        RecordKind::SenderKeyMemory,
        RecordKind::Creds,
    ];

    /// The wire string for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Session => "session",
            RecordKind::PreKey => "pre-key",
            RecordKind::SenderKey => "sender-key",
            RecordKind::AppStateSyncKey => "app-state-sync-key",
            RecordKind::AppStateSyncVersion => "app-state-sync-version",
            RecordKind::SenderKeyMemory => "sender-key-memory",
            RecordKind::Creds => "creds",
        }
    }

    /// Whether this is the distinguished root credential kind
    pub fn is_creds(&self) -> bool {
        matches!(self, RecordKind::Creds)
    }

    /// Decode a stored payload into the typed record for this kind.
    ///
    /// `AppStateSyncKey` payloads go through the lenient
    /// [`AppDataSync::from_value`] reconstruction, which tolerates the
    /// partial and stringly-typed shapes older producers wrote. All other
    /// kinds deserialize directly. The root credential record is not a
    /// keyed record and is rejected here.
    pub fn decode_record(&self, json: serde_json::Value) -> Result<KeyRecord> {
        Ok(match self {
            RecordKind::Session => KeyRecord::Session(authdb_codec::from_json(json)?),
            RecordKind::PreKey => KeyRecord::PreKey(authdb_codec::from_json(json)?),
            RecordKind::SenderKey => KeyRecord::SenderKey(authdb_codec::from_json(json)?),
            RecordKind::AppStateSyncKey => {
                let value = authdb_codec::decode(json)?;
                KeyRecord::AppStateSyncKey(AppDataSync::from_value(&value))
            }
            RecordKind::AppStateSyncVersion => {
                KeyRecord::AppStateSyncVersion(authdb_codec::from_json(json)?)
            }
            RecordKind::SenderKeyMemory => {
                KeyRecord::SenderKeyMemory(authdb_codec::from_json(json)?)
            }
            RecordKind::Creds => return Err(RecordError::CredsNotKeyed),
        })
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| RecordError::UnknownKind(s.to_string()))
    }
}

impl Serialize for RecordKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecordKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A typed keyed record: one payload shape per non-creds [`RecordKind`]
#[derive(Debug, Clone, PartialEq)]
pub enum KeyRecord {
    /// Serialized session ratchet state
    Session(Bytes),
    /// A stored pre-key pair
    PreKey(KeyPair),
    /// Serialized sender key state
    SenderKey(Bytes),
    /// Reconstructed app-state sync key material
    AppStateSyncKey(AppDataSync),
    /// App-state sync hash state
    AppStateSyncVersion(LtHashState),
    /// Addresses known to hold our sender key
    SenderKeyMemory(BTreeMap<String, bool>),
}

impl KeyRecord {
    /// The kind this record belongs to
    pub fn kind(&self) -> RecordKind {
        match self {
            KeyRecord::Session(_) => RecordKind::Session,
            KeyRecord::PreKey(_) => RecordKind::PreKey,
            KeyRecord::SenderKey(_) => RecordKind::SenderKey,
            KeyRecord::AppStateSyncKey(_) => RecordKind::AppStateSyncKey,
            KeyRecord::AppStateSyncVersion(_) => RecordKind::AppStateSyncVersion,
            KeyRecord::SenderKeyMemory(_) => RecordKind::SenderKeyMemory,
        }
    }

    /// Serialize the payload into its JSON-safe stored form.
    ///
    /// Only the payload is stored; the kind lives in the derived key.
    pub fn to_stored(&self) -> Result<serde_json::Value> {
        Ok(match self {
            KeyRecord::Session(b) => authdb_codec::to_json(b)?,
            KeyRecord::PreKey(k) => authdb_codec::to_json(k)?,
            KeyRecord::SenderKey(b) => authdb_codec::to_json(b)?,
            KeyRecord::AppStateSyncKey(k) => authdb_codec::to_json(k)?,
            KeyRecord::AppStateSyncVersion(v) => authdb_codec::to_json(v)?,
            KeyRecord::SenderKeyMemory(m) => authdb_codec::to_json(m)?,
        })
    }
}
