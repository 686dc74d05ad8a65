//! The typed credential model
//!
//! These are the payload shapes persisted by the store. Field names
//! serialize in camelCase and binary fields are [`Bytes`], so documents are
//! wire-compatible with those written by earlier producers of the same
//! format.
//!
//! [`AuthCreds`] is the root credential record: long-lived identity keys,
//! registration counters, and account metadata. It is owned in memory by the
//! session handle; the store only reads it when asked to persist.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use authdb_codec::{Bytes, Value};

/// A Curve25519 key pair, stored as raw public/private bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPair {
    /// Public key bytes
    pub public: Bytes,
    /// Private key bytes
    pub private: Bytes,
}

/// A pre-key pair signed by the identity key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedKeyPair {
    /// The signed key pair
    pub key_pair: KeyPair,
    /// XEdDSA signature by the identity key over the type-prefixed public key
    pub signature: Bytes,
    /// Key index
    pub key_id: u32,
    /// Optional signing time, seconds since epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_s: Option<u64>,
}

/// Directory information about a contact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// The contact's address
    pub id: String,
    /// Alternate (linked-device) address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lid: Option<String>,
    /// Saved name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Push name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<String>,
    /// Business-verified name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_name: Option<String>,
    /// Profile picture URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    /// Status text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Signed account attestation data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Serialized account details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Bytes>,
    /// Key the account signature was made with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_signature_key: Option<Bytes>,
    /// Account signature over the details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_signature: Option<Bytes>,
    /// Device signature over the details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_signature: Option<Bytes>,
}

/// A remote protocol address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolAddress {
    /// User part of the address
    pub name: String,
    /// Device index
    #[serde(default)]
    pub device_id: u32,
}

/// A known identity binding of a remote address to its identity key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalIdentity {
    /// The remote address
    pub identifier: ProtocolAddress,
    /// Its identity key
    pub identifier_key: Bytes,
}

/// One entry of an [`LtHashState`] index map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexValue {
    /// MAC over the indexed value
    pub value_mac: Bytes,
}

/// App-state synchronization hash state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LtHashState {
    /// State version counter
    #[serde(default)]
    pub version: u64,
    /// Rolling LT hash
    #[serde(default)]
    pub hash: Bytes,
    /// Index-MAC (base64) to value-MAC map
    #[serde(default)]
    pub index_value_map: BTreeMap<String, IndexValue>,
}

/// Device fingerprint of an app-state sync key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fingerprint {
    /// Raw fingerprint id
    #[serde(default)]
    pub raw_id: u32,
    /// Current device index
    #[serde(default)]
    pub current_index: u32,
    /// Device indexes covered by the key
    #[serde(default)]
    pub device_indexes: Vec<u32>,
}

/// App-state synchronization key material
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDataSync {
    /// The sync key bytes
    #[serde(default)]
    pub key_data: Bytes,
    /// Fingerprint of the key
    #[serde(default)]
    pub fingerprint: Fingerprint,
    /// Key creation time, seconds since epoch
    #[serde(default)]
    pub timestamp: u64,
}

impl AppDataSync {
    /// Lenient reconstruction from a decoded value graph.
    ///
    /// Older producers stored this record in several shapes: key bytes as a
    /// tagged buffer, a bare base64 string, or a numeric array; the
    /// timestamp as a number or a decimal string. Missing fields become
    /// defaults, mirroring protobuf object reconstruction, so a partial
    /// record never fails to load.
    pub fn from_value(value: &Value) -> Self {
        let fingerprint = value.get("fingerprint");
        AppDataSync {
            key_data: value_bytes(value.get("keyData")),
            fingerprint: Fingerprint {
                raw_id: value_u64(fingerprint.and_then(|f| f.get("rawId"))) as u32,
                current_index: value_u64(fingerprint.and_then(|f| f.get("currentIndex"))) as u32,
                device_indexes: fingerprint
                    .and_then(|f| f.get("deviceIndexes"))
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .map(|i| value_u64(Some(i)) as u32)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            timestamp: value_u64(value.get("timestamp")),
        }
    }
}

/// Bytes from any shape a legacy producer used
fn value_bytes(value: Option<&Value>) -> Bytes {
    match value {
        Some(Value::Bytes(b)) => b.clone(),
        Some(Value::String(s)) => Bytes::from_base64(s).unwrap_or_default(),
        Some(Value::Array(items)) => {
            let bytes: Vec<u8> = items
                .iter()
                .filter_map(Value::as_int)
                .filter(|b| (0..=255).contains(b))
                .map(|b| b as u8)
                .collect();
            Bytes::new(bytes)
        }
        _ => Bytes::empty(),
    }
}

/// Unsigned integer from a number or decimal string
fn value_u64(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Int(i)) => (*i).max(0) as u64,
        Some(Value::Float(f)) if *f >= 0.0 => *f as u64,
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

/// Per-account behavior settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSettings {
    /// Whether chats unarchive on new messages
    #[serde(default)]
    pub unarchive_chats: bool,
    /// Default disappearing-message settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_disappearing_mode: Option<DisappearingMode>,
}

/// Disappearing-message configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisappearingMode {
    /// Message lifetime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_expiration: Option<u64>,
    /// When the setting was changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_setting_timestamp: Option<i64>,
}

/// How a pending registration is to be verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationMethod {
    /// Verification code by SMS
    Sms,
    /// Verification code by voice call
    Voice,
    /// Captcha verification
    Captcha,
}

/// Phone-number registration parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    /// Full phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Country calling code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number_country_code: Option<String>,
    /// National number part
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number_national_number: Option<String>,
    /// Mobile country code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number_mobile_country_code: Option<String>,
    /// Mobile network code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number_mobile_network_code: Option<String>,
    /// Verification method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<RegistrationMethod>,
    /// Captcha response, when the method requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha: Option<String>,
}

/// A history message already folded into local state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedHistoryMessage {
    /// The message key, kept opaque
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<serde_json::Value>,
    /// Message timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_timestamp: Option<i64>,
}

/// The root credential record of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCreds {
    /// Noise protocol static key pair
    pub noise_key: KeyPair,
    /// Ephemeral key pair used during pairing
    pub pairing_ephemeral_key_pair: KeyPair,
    /// Long-lived identity key pair
    pub signed_identity_key: KeyPair,
    /// Signed pre-key published for session setup
    pub signed_pre_key: SignedKeyPair,
    /// Registration id, 14 bits
    #[serde(default)]
    pub registration_id: u32,
    /// Account-device verification secret, base64
    #[serde(default)]
    pub adv_secret_key: String,
    /// Our own contact entry, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub me: Option<Contact>,
    /// Signed account attestation, once registered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    /// Known identity bindings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_identities: Option<Vec<SignalIdentity>>,
    /// Id of our current app-state sync key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_app_state_key_id: Option<String>,
    /// Lowest pre-key id not yet uploaded
    #[serde(default)]
    pub first_unuploaded_pre_key_id: u32,
    /// Next pre-key id to allocate
    #[serde(default)]
    pub next_pre_key_id: u32,
    /// Last full account sync, seconds since epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_account_sync_timestamp: Option<u64>,
    /// Platform name reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// History messages already processed
    #[serde(default)]
    pub processed_history_messages: Vec<ProcessedHistoryMessage>,
    /// Count of completed account syncs
    #[serde(default)]
    pub account_sync_counter: u32,
    /// Per-account behavior settings
    #[serde(default)]
    pub account_settings: AccountSettings,
    /// Stable device identifier
    #[serde(default)]
    pub device_id: String,
    /// Stable phone identifier
    #[serde(default)]
    pub phone_id: String,
    /// Random identity blob
    #[serde(default)]
    pub identity_id: Bytes,
    /// Whether this session completed registration
    #[serde(default)]
    pub registered: bool,
    /// Backup encryption token
    #[serde(default)]
    pub backup_token: Bytes,
    /// Pending registration parameters
    #[serde(default)]
    pub registration: RegistrationOptions,
    /// Pairing code, while pairing is in progress
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<String>,
    /// Hash of the last received server props
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_prop_hash: Option<String>,
    /// Server-assigned routing information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_info: Option<Bytes>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_creds_serialize_uses_wire_field_names() {
        let creds = AuthCreds::generate();
        let json = serde_json::to_value(&creds).unwrap();
        let obj = json.as_object().unwrap();
        for field in [
            "noiseKey",
            "pairingEphemeralKeyPair",
            "signedIdentityKey",
            "signedPreKey",
            "registrationId",
            "advSecretKey",
            "firstUnuploadedPreKeyId",
            "nextPreKeyId",
            "processedHistoryMessages",
            "accountSyncCounter",
            "accountSettings",
            "deviceId",
            "phoneId",
            "identityId",
            "registered",
            "backupToken",
            "registration",
        ] {
            assert!(obj.contains_key(field), "missing field {field}");
        }
    }

    #[test]
    fn test_creds_roundtrip() {
        let creds = AuthCreds::generate();
        let json = serde_json::to_value(&creds).unwrap();
        let back: AuthCreds = serde_json::from_value(json).unwrap();
        assert_eq!(back, creds);
    }

    #[test]
    fn test_creds_buffers_are_tagged_in_json() {
        let creds = AuthCreds::generate();
        let json = serde_json::to_value(&creds).unwrap();
        let noise_public = &json["noiseKey"]["public"];
        assert_eq!(noise_public["type"], json!("Buffer"));
        assert!(noise_public["data"].is_string());
    }

    #[test]
    fn test_creds_tolerates_missing_optional_fields() {
        // A minimal document as the earliest producers wrote it: key
        // material only.
        let creds = AuthCreds::generate();
        let minimal = json!({
            "noiseKey": serde_json::to_value(&creds.noise_key).unwrap(),
            "pairingEphemeralKeyPair":
                serde_json::to_value(&creds.pairing_ephemeral_key_pair).unwrap(),
            "signedIdentityKey": serde_json::to_value(&creds.signed_identity_key).unwrap(),
            "signedPreKey": serde_json::to_value(&creds.signed_pre_key).unwrap(),
        });
        let parsed: AuthCreds = serde_json::from_value(minimal).unwrap();
        assert_eq!(parsed.noise_key, creds.noise_key);
        assert!(!parsed.registered);
        assert_eq!(parsed.account_sync_counter, 0);
        assert!(parsed.me.is_none());
    }

    #[test]
    fn test_signed_key_pair_field_names() {
        let creds = AuthCreds::generate();
        let json = serde_json::to_value(&creds.signed_pre_key).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("keyPair"));
        assert!(obj.contains_key("keyId"));
        assert!(obj.contains_key("signature"));
        assert!(!obj.contains_key("timestampS"));
    }

    #[test]
    fn test_lt_hash_state_roundtrip() {
        let mut map = BTreeMap::new();
        map.insert(
            "aW5kZXg=".to_string(),
            IndexValue {
                value_mac: Bytes::from(b"mac".as_slice()),
            },
        );
        let state = LtHashState {
            version: 3,
            hash: Bytes::from(vec![1u8; 128]),
            index_value_map: map,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert!(json["indexValueMap"]["aW5kZXg="]["valueMac"].is_object());
        let back: LtHashState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_app_data_sync_from_canonical_value() {
        let record = AppDataSync {
            key_data: Bytes::from(b"sync-key".as_slice()),
            fingerprint: Fingerprint {
                raw_id: 7,
                current_index: 2,
                device_indexes: vec![0, 2],
            },
            timestamp: 1700000000,
        };
        let json = serde_json::to_value(&record).unwrap();
        let value = authdb_codec::decode(json).unwrap();
        assert_eq!(AppDataSync::from_value(&value), record);
    }

    #[test]
    fn test_app_data_sync_from_legacy_shapes() {
        // Base64 key data, string timestamp, as protobuf-JSON producers
        // wrote it.
        let json = json!({
            "keyData": "c3luYy1rZXk=",
            "fingerprint": {"rawId": 7, "currentIndex": 2, "deviceIndexes": [0, 2]},
            "timestamp": "1700000000",
        });
        let value = authdb_codec::decode(json).unwrap();
        let record = AppDataSync::from_value(&value);
        assert_eq!(record.key_data.as_slice(), b"sync-key");
        assert_eq!(record.fingerprint.raw_id, 7);
        assert_eq!(record.timestamp, 1700000000);
    }

    #[test]
    fn test_app_data_sync_from_partial_value() {
        let value = authdb_codec::decode(json!({})).unwrap();
        let record = AppDataSync::from_value(&value);
        assert!(record.key_data.is_empty());
        assert_eq!(record.fingerprint, Fingerprint::default());
        assert_eq!(record.timestamp, 0);
    }

    #[test]
    fn test_registration_method_wire_form() {
        assert_eq!(
            serde_json::to_value(RegistrationMethod::Sms).unwrap(),
            json!("sms")
        );
        let parsed: RegistrationMethod = serde_json::from_value(json!("captcha")).unwrap();
        assert_eq!(parsed, RegistrationMethod::Captcha);
    }
}
