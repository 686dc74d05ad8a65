//! The session handle
//!
//! [`Session::open`] is the entry point of the store: it loads (or
//! bootstraps) the root credential record and hands back the handle that
//! owns it. The handle's lifecycle is Unopened → Open → Closed: after
//! [`Session::remove_creds`] the handle is logically closed and must not be
//! reused for keyed operations — this is a caller contract, not a guard.

use std::sync::Arc;

use tracing::{debug, warn};

use authdb_backend::{Document, DocumentBackend};
use authdb_core::{root_key, AuthCreds, StoreConfig};

use crate::error::StoreResult;
use crate::keystore::{KeyStore, StoreCore};

/// An opened credential store session
///
/// Owns the in-memory root credential record exclusively: the caller
/// mutates it through [`creds_mut`](Self::creds_mut) between saves, and the
/// store only reads it when [`save_creds`](Self::save_creds) is called.
/// Nothing is persisted automatically.
pub struct Session<B: DocumentBackend> {
    creds: AuthCreds,
    keys: KeyStore<B>,
}

impl<B: DocumentBackend> Session<B> {
    /// Open a session against `backend`.
    ///
    /// Reads the root credential record under lock. If it is absent — or
    /// unreadable, per the store's read policy — a fresh record is
    /// default-constructed and held in memory; no backend write happens
    /// until [`save_creds`](Self::save_creds).
    ///
    /// The backend is wrapped in the retry adapter configured by
    /// `config.max_retries` / `config.retry_request_delay_ms`.
    pub async fn open(backend: B, config: StoreConfig) -> StoreResult<Self> {
        let core = Arc::new(StoreCore::new(backend, config));
        let root = root_key(core.session());

        let creds = match core.read_value(&root).await {
            Some(json) => match authdb_codec::from_json::<AuthCreds>(json) {
                Ok(creds) => {
                    debug!(session = core.session(), "loaded stored credentials");
                    creds
                }
                Err(err) => {
                    warn!(session = core.session(), %err,
                        "stored credentials undecodable; bootstrapping fresh");
                    AuthCreds::generate()
                }
            },
            None => {
                debug!(session = core.session(), "no stored credentials; bootstrapping fresh");
                AuthCreds::generate()
            }
        };

        Ok(Self {
            creds,
            keys: KeyStore::new(core),
        })
    }

    /// The root credential record
    pub fn creds(&self) -> &AuthCreds {
        &self.creds
    }

    /// Mutable access to the root credential record.
    ///
    /// Mutations are in-memory only until [`save_creds`](Self::save_creds).
    pub fn creds_mut(&mut self) -> &mut AuthCreds {
        &mut self.creds
    }

    /// The keyed-record surface of this session
    pub fn keys(&self) -> &KeyStore<B> {
        &self.keys
    }

    /// The configuration this session was opened with
    pub fn config(&self) -> &StoreConfig {
        self.keys.core().config()
    }

    /// Persist the in-memory root credential record, under lock.
    pub async fn save_creds(&self) -> StoreResult<()> {
        let core = self.keys.core();
        let json = authdb_codec::to_json(&self.creds)?;
        core.write_value(&root_key(core.session()), json).await
    }

    /// Delete every record tagged with this session except the root
    /// credential record.
    ///
    /// Resets derived protocol state while retaining long-term identity.
    /// Best-effort: individual documents that fail to delete are skipped.
    pub async fn clear(&self) -> StoreResult<()> {
        let core = self.keys.core();
        let root = root_key(core.session());
        core.backend()
            .delete_where_session(core.table(), core.session(), Some(&root))
            .await?;
        debug!(session = core.session(), "cleared keyed records");
        Ok(())
    }

    /// Delete every record tagged with this session, root credential record
    /// included — full teardown.
    ///
    /// The handle is logically closed afterwards; keyed operations on it
    /// would repopulate the backend and must not be issued.
    pub async fn remove_creds(&self) -> StoreResult<()> {
        let core = self.keys.core();
        core.backend()
            .delete_where_session(core.table(), core.session(), None)
            .await?;
        debug!(session = core.session(), "removed all session records");
        Ok(())
    }

    /// Raw diagnostic read: fetch the document stored under `record_id` in
    /// an arbitrary collection, bypassing key derivation, locking, and the
    /// codec.
    pub async fn query(
        &self,
        collection: &str,
        record_id: &str,
    ) -> StoreResult<Option<Document>> {
        Ok(self.keys.core().backend().get(collection, record_id).await?)
    }
}
