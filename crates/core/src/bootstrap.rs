//! Default construction of a fresh root credential record
//!
//! Opening a store against an empty backend yields a record built here:
//! fresh random key material, zeroed counters, unregistered status. Nothing
//! in this module performs I/O; the generated record lives in memory until
//! the caller explicitly saves it.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;
use x25519_dalek::{PublicKey, StaticSecret};
use xeddsa::xed25519;
use xeddsa::Sign as _;

use crate::creds::{AccountSettings, AuthCreds, KeyPair, RegistrationOptions, SignedKeyPair};
use authdb_codec::Bytes;

/// Type prefix of a published public key in a signed key bundle
const KEY_BUNDLE_TYPE: u8 = 0x05;

impl KeyPair {
    /// Generate a fresh Curve25519 key pair
    pub fn generate() -> Self {
        key_pair_from_secret(&StaticSecret::random_from_rng(OsRng))
    }
}

fn key_pair_from_secret(secret: &StaticSecret) -> KeyPair {
    let public = PublicKey::from(secret);
    KeyPair {
        public: Bytes::from(public.to_bytes()),
        private: Bytes::from(secret.to_bytes()),
    }
}

/// Generate a pre-key pair and sign its type-prefixed public key with the
/// identity key (XEdDSA over the Curve25519 identity secret).
fn signed_key_pair(identity_secret: &StaticSecret, key_id: u32) -> SignedKeyPair {
    let pre_key = StaticSecret::random_from_rng(OsRng);
    let pre_key_public = PublicKey::from(&pre_key);

    let mut message = Vec::with_capacity(33);
    message.push(KEY_BUNDLE_TYPE);
    message.extend_from_slice(pre_key_public.as_bytes());

    let signing_key = xed25519::PrivateKey::from(identity_secret);
    let signature: [u8; 64] = signing_key.sign(message.as_slice(), &mut rand_v010::rng());

    SignedKeyPair {
        key_pair: key_pair_from_secret(&pre_key),
        signature: Bytes::from(signature),
        key_id,
        timestamp_s: None,
    }
}

/// A random 14-bit registration id
fn generate_registration_id() -> u32 {
    let mut bytes = [0u8; 2];
    OsRng.fill_bytes(&mut bytes);
    (u16::from_le_bytes(bytes) & 16383) as u32
}

fn random_bytes<const N: usize>() -> Bytes {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    Bytes::from(bytes)
}

impl AuthCreds {
    /// Default-construct a fresh root credential record.
    ///
    /// Fresh random key material, counters at their starting values,
    /// unregistered status. Performs no backend I/O.
    pub fn generate() -> Self {
        let identity_secret = StaticSecret::random_from_rng(OsRng);

        AuthCreds {
            noise_key: KeyPair::generate(),
            pairing_ephemeral_key_pair: KeyPair::generate(),
            signed_identity_key: key_pair_from_secret(&identity_secret),
            signed_pre_key: signed_key_pair(&identity_secret, 1),
            registration_id: generate_registration_id(),
            adv_secret_key: STANDARD.encode(random_bytes::<32>()),
            me: None,
            account: None,
            signal_identities: None,
            my_app_state_key_id: None,
            first_unuploaded_pre_key_id: 1,
            next_pre_key_id: 1,
            last_account_sync_timestamp: None,
            platform: None,
            processed_history_messages: Vec::new(),
            account_sync_counter: 0,
            account_settings: AccountSettings::default(),
            device_id: URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes()),
            phone_id: Uuid::new_v4().to_string(),
            identity_id: random_bytes::<20>(),
            registered: false,
            backup_token: random_bytes::<20>(),
            registration: RegistrationOptions::default(),
            pairing_code: None,
            last_prop_hash: None,
            routing_info: None,
        }
    }
}
