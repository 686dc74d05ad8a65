//! The persisted document shape
//!
//! Every stored record is one document: the derived key, the codec-encoded
//! value, the owning session's tag, and an advisory creation timestamp.
//! The session tag is what bulk operations filter on; the timestamp is
//! input to backend-side expiry policies and is never read by the store
//! core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored document
///
/// Invariant: `value` never contains a raw binary buffer — only the codec's
/// tagged representation or plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// The derived backend key this document is stored under
    pub key: String,
    /// Codec-encoded record value
    pub value: serde_json::Value,
    /// Session tag, shared by all of one session's documents
    pub session: String,
    /// When the document was written; refreshed on every write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Create a document stamped with the current time
    pub fn new(
        key: impl Into<String>,
        value: serde_json::Value,
        session: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value,
            session: session.into(),
            created_at: Some(Utc::now()),
        }
    }

    /// Merge-fill unset fields from an existing document.
    ///
    /// This is the `merge: true` upsert semantics: the new document wins on
    /// every field it sets; fields it leaves unset are carried over.
    pub fn merge_from(mut self, existing: &Document) -> Self {
        if self.created_at.is_none() {
            self.created_at = existing.created_at;
        }
        self
    }
}
