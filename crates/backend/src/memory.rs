//! In-memory document backend
//!
//! A `DashMap`-backed backend: lock-free reads, sharded writes. Used as the
//! test substrate and for ephemeral sessions that should not outlive the
//! process. Cloning shares the underlying tables, so one backend handle can
//! serve several sessions.
//!
//! An optional time-to-live window makes documents count as absent once
//! their `createdAt` falls out of the window, mirroring the expiry policy a
//! document database would enforce with a TTL index. Expiry is lazy: an
//! expired document is evicted when a read trips over it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::document::Document;
use crate::error::BackendResult;
use crate::DocumentBackend;

type Table = DashMap<String, Document>;

/// An in-memory, shareable document backend
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: DashMap<String, Table>,
    ttl: Option<Duration>,
}

impl MemoryBackend {
    /// Create an empty backend with no expiry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty backend whose documents expire `ttl` after their
    /// last write
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: DashMap::new(),
                ttl: Some(ttl),
            }),
        }
    }

    /// Total number of live documents across all tables
    pub fn len(&self) -> usize {
        self.inner.tables.iter().map(|table| table.len()).sum()
    }

    /// Whether no document is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expired(&self, document: &Document) -> bool {
        match (self.inner.ttl, document.created_at) {
            (Some(ttl), Some(created_at)) => {
                let age = Utc::now().signed_duration_since(created_at);
                age.to_std().map(|age| age > ttl).unwrap_or(false)
            }
            // Without a window, or without a stamp, a document never expires.
            _ => false,
        }
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn get(&self, table: &str, key: &str) -> BackendResult<Option<Document>> {
        let Some(table) = self.inner.tables.get(table) else {
            return Ok(None);
        };
        let Some(document) = table.get(key).map(|doc| doc.clone()) else {
            return Ok(None);
        };
        if self.expired(&document) {
            table.remove(key);
            return Ok(None);
        }
        Ok(Some(document))
    }

    async fn put(&self, table: &str, document: Document, merge: bool) -> BackendResult<()> {
        let table = self.inner.tables.entry(table.to_string()).or_default();
        let key = document.key.clone();
        let merged = match table.get(&key) {
            Some(existing) if merge => document.merge_from(&existing),
            _ => document,
        };
        table.insert(key, merged);
        Ok(())
    }

    async fn delete(&self, table: &str, key: &str) -> BackendResult<()> {
        if let Some(table) = self.inner.tables.get(table) {
            table.remove(key);
        }
        Ok(())
    }

    async fn delete_where_session(
        &self,
        table: &str,
        session: &str,
        exclude_key: Option<&str>,
    ) -> BackendResult<()> {
        if let Some(table) = self.inner.tables.get(table) {
            table.retain(|key, document| {
                document.session != session || exclude_key == Some(key.as_str())
            });
        }
        Ok(())
    }
}
