//! Keyed record operations
//!
//! [`KeyStore`] is the read/write surface for every record kind other than
//! the root credential record: batch get, best-effort batch set, and a
//! locked read-modify-write primitive. Keyed records have no in-memory
//! cache — every read goes to the backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::warn;

use authdb_backend::{Document, DocumentBackend, Retrying, RetryPolicy};
use authdb_core::{derive_key, KeyRecord, RecordKind, StoreConfig};
use authdb_lock::KeyedLocks;

use crate::error::{StoreError, StoreResult};

/// Shared internals of one opened session: the (retrying) backend handle,
/// the configuration, and the per-key lock registry. The registry lives and
/// dies with this struct, one per store instance.
pub(crate) struct StoreCore<B> {
    backend: Retrying<B>,
    config: StoreConfig,
    locks: KeyedLocks,
}

impl<B: DocumentBackend> StoreCore<B> {
    pub(crate) fn new(backend: B, config: StoreConfig) -> Self {
        let policy = RetryPolicy {
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.retry_request_delay_ms),
        };
        Self {
            backend: Retrying::new(backend, policy),
            config,
            locks: KeyedLocks::new(),
        }
    }

    pub(crate) fn session(&self) -> &str {
        &self.config.session
    }

    pub(crate) fn table(&self) -> &str {
        &self.config.table_name
    }

    pub(crate) fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub(crate) fn backend(&self) -> &Retrying<B> {
        &self.backend
    }

    /// Locked read of one stored value.
    ///
    /// Store-wide read policy: absence, backend failure, and unparseable
    /// documents all surface as `None`; failures are logged, never raised.
    pub(crate) async fn read_value(&self, key: &str) -> Option<serde_json::Value> {
        self.locks
            .with_lock(key, || self.read_value_unlocked(key))
            .await
    }

    async fn read_value_unlocked(&self, key: &str) -> Option<serde_json::Value> {
        match self.backend.get(self.table(), key).await {
            Ok(found) => found.map(|document| document.value),
            Err(err) => {
                warn!(key, %err, "read failed; treating record as absent");
                None
            }
        }
    }

    /// Locked write of one stored value, stamped and session-tagged.
    pub(crate) async fn write_value(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> StoreResult<()> {
        self.locks
            .with_lock(key, || self.write_value_unlocked(key, value))
            .await
    }

    async fn write_value_unlocked(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> StoreResult<()> {
        let document = Document::new(key, value, self.session());
        self.backend.put(self.table(), document, true).await?;
        Ok(())
    }

    /// Locked delete of one stored value.
    pub(crate) async fn remove_value(&self, key: &str) -> StoreResult<()> {
        self.locks
            .with_lock(key, || self.remove_value_unlocked(key))
            .await
    }

    async fn remove_value_unlocked(&self, key: &str) -> StoreResult<()> {
        self.backend.delete(self.table(), key).await?;
        Ok(())
    }

    fn decode_or_absent(&self, kind: RecordKind, key: &str, json: serde_json::Value) -> Option<KeyRecord> {
        match kind.decode_record(json) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(key, %err, "undecodable record; treating as absent");
                None
            }
        }
    }
}

/// Read/write surface for keyed protocol records
///
/// Cloning is cheap and shares the session's backend handle and lock
/// registry.
pub struct KeyStore<B: DocumentBackend> {
    core: Arc<StoreCore<B>>,
}

impl<B: DocumentBackend> Clone for KeyStore<B> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<B: DocumentBackend> KeyStore<B> {
    pub(crate) fn new(core: Arc<StoreCore<B>>) -> Self {
        Self { core }
    }

    pub(crate) fn core(&self) -> &Arc<StoreCore<B>> {
        &self.core
    }

    /// Fetch records of one kind by id.
    ///
    /// Ids are fetched concurrently, each under its own key lock. The
    /// result maps every requested id; absent records — including records
    /// that failed to read or decode, per the store's read policy — map to
    /// `None`.
    pub async fn get(
        &self,
        kind: RecordKind,
        ids: &[&str],
    ) -> HashMap<String, Option<KeyRecord>> {
        let lookups = ids.iter().map(|id| async move {
            let key = derive_key(self.core.session(), kind, id);
            let record = match self.core.read_value(&key).await {
                Some(json) => self.core.decode_or_absent(kind, &key, json),
                None => None,
            };
            (id.to_string(), record)
        });
        join_all(lookups).await.into_iter().collect()
    }

    /// Apply a batch of writes and deletes.
    ///
    /// Every entry is attempted concurrently, each under its own key lock:
    /// a present record is encoded and written, an absent marker deletes.
    /// Entries fail independently — one failure never blocks unrelated
    /// entries — and a batch with failures reports them collectively as
    /// [`StoreError::Batch`] after the whole batch ran. Re-issuing a batch
    /// is idempotent.
    pub async fn set(&self, data: KeyDataSet) -> StoreResult<()> {
        let mut tasks = Vec::with_capacity(data.len());
        for (kind, entries) in data.entries {
            for (id, record) in entries {
                let key = derive_key(self.core.session(), kind, &id);
                tasks.push(async move {
                    let result = match record {
                        Some(record) => match record.to_stored() {
                            Ok(json) => self.core.write_value(&key, json).await,
                            Err(err) => Err(StoreError::from(err)),
                        },
                        None => self.core.remove_value(&key).await,
                    };
                    if let Err(err) = &result {
                        warn!(key = %key, %err, "batch entry failed");
                    }
                    result
                });
            }
        }

        let results = join_all(tasks).await;
        let total = results.len();
        let failed = results.iter().filter(|result| result.is_err()).count();
        if failed > 0 {
            return Err(StoreError::Batch { failed, total });
        }
        Ok(())
    }

    /// Read-modify-write one record under a single lock acquisition.
    ///
    /// `f` receives the current record (or `None`) and returns the record
    /// to store (`None` deletes). Concurrent `update`s of the same key
    /// apply in some total order with no lost update; this is the primitive
    /// the per-key lock exists for, since a caller-side get-then-set spans
    /// two acquisitions.
    pub async fn update<F>(
        &self,
        kind: RecordKind,
        id: &str,
        f: F,
    ) -> StoreResult<Option<KeyRecord>>
    where
        F: FnOnce(Option<KeyRecord>) -> Option<KeyRecord> + Send,
    {
        let key = derive_key(self.core.session(), kind, id);
        self.core
            .locks
            .with_lock(&key, || async {
                let current = match self.core.read_value_unlocked(&key).await {
                    Some(json) => self.core.decode_or_absent(kind, &key, json),
                    None => None,
                };
                let next = f(current);
                match &next {
                    Some(record) => {
                        let json = record.to_stored()?;
                        self.core.write_value_unlocked(&key, json).await?;
                    }
                    None => self.core.remove_value_unlocked(&key).await?,
                }
                Ok(next)
            })
            .await
    }
}

/// A batch of keyed writes and deletes, keyed by record kind and id
///
/// Mirrors the wire shape `{ kind: { id: record | null } }`: a present
/// record is an upsert, an explicit absent marker is a delete.
#[derive(Debug, Clone, Default)]
pub struct KeyDataSet {
    entries: BTreeMap<RecordKind, BTreeMap<String, Option<KeyRecord>>>,
}

impl KeyDataSet {
    /// An empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an upsert; the kind is taken from the record itself
    pub fn put(mut self, id: impl Into<String>, record: KeyRecord) -> Self {
        self.entries
            .entry(record.kind())
            .or_default()
            .insert(id.into(), Some(record));
        self
    }

    /// Add a delete marker for `(kind, id)`
    pub fn delete(mut self, kind: RecordKind, id: impl Into<String>) -> Self {
        self.entries
            .entry(kind)
            .or_default()
            .insert(id.into(), None);
        self
    }

    /// Insert an entry in place (for callers building batches in loops)
    pub fn insert(&mut self, kind: RecordKind, id: impl Into<String>, entry: Option<KeyRecord>) {
        self.entries.entry(kind).or_default().insert(id.into(), entry);
    }

    /// Total number of entries across all kinds
    pub fn len(&self) -> usize {
        self.entries.values().map(|entries| entries.len()).sum()
    }

    /// Whether the batch holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|entries| entries.is_empty())
    }
}
