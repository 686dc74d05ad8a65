//! Filesystem document backend
//!
//! One JSON file per document, grouped into one directory per table:
//! `<root>/<table>/<key>.json`. Writes go to a temporary file first and
//! are renamed into place, so a crashed write never leaves a half-written
//! document behind. Suitable for single-process durable sessions without a
//! database server.
//!
//! Keys derived by the store are already backend-safe; raw diagnostic keys
//! are validated here so they cannot escape the table directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use crate::document::Document;
use crate::error::{BackendError, BackendResult};
use crate::DocumentBackend;

/// A document backend storing one JSON file per record
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `root`. Directories are created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory of this backend
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, table: &str, key: &str) -> BackendResult<PathBuf> {
        validate_component(table)?;
        validate_component(key)?;
        Ok(self.root.join(table).join(format!("{key}.json")))
    }

    async fn read_document(&self, path: &Path) -> BackendResult<Option<Document>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Reject path components that could address outside the table directory
fn validate_component(component: &str) -> BackendResult<()> {
    let unsafe_component = component.is_empty()
        || component == "."
        || component == ".."
        || component.contains(['/', '\\', '\0']);
    if unsafe_component {
        return Err(BackendError::InvalidKey(component.to_string()));
    }
    Ok(())
}

#[async_trait]
impl DocumentBackend for FileBackend {
    async fn get(&self, table: &str, key: &str) -> BackendResult<Option<Document>> {
        let path = self.document_path(table, key)?;
        self.read_document(&path).await
    }

    async fn put(&self, table: &str, document: Document, merge: bool) -> BackendResult<()> {
        let path = self.document_path(table, &document.key)?;
        fs::create_dir_all(self.root.join(table)).await?;

        let document = if merge {
            match self.read_document(&path).await? {
                Some(existing) => document.merge_from(&existing),
                None => document,
            }
        } else {
            document
        };

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&document)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, key: &str) -> BackendResult<()> {
        let path = self.document_path(table, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_where_session(
        &self,
        table: &str,
        session: &str,
        exclude_key: Option<&str>,
    ) -> BackendResult<()> {
        validate_component(table)?;
        let dir = self.root.join(table);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        let excluded_file = exclude_key.map(|key| format!("{key}.json"));
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let (Some(excluded), Some(name)) =
                (excluded_file.as_deref(), path.file_name().and_then(|n| n.to_str()))
            {
                if name == excluded {
                    continue;
                }
            }

            // Best-effort sweep: an unreadable or undeletable document is
            // skipped, never aborting the bulk operation.
            match self.read_document(&path).await {
                Ok(Some(document)) if document.session == session => {
                    if let Err(err) = fs::remove_file(&path).await {
                        warn!(path = %path.display(), %err, "skipping undeletable document");
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping unreadable document");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_get_absent_is_none() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        assert!(backend.get("auth", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_get_delete_roundtrip() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        let doc = Document::new("s-session-a", json!({"type": "Buffer", "data": "eA=="}), "s");

        backend.put("auth", doc.clone(), true).await.unwrap();
        let read = backend.get("auth", "s-session-a").await.unwrap().unwrap();
        assert_eq!(read, doc);

        backend.delete("auth", "s-session-a").await.unwrap();
        assert!(backend.get("auth", "s-session-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_absent_succeeds() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        backend.delete("auth", "never-written").await.unwrap();
    }

    #[tokio::test]
    async fn test_merge_preserves_missing_timestamp() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        backend
            .put("auth", Document::new("k", json!(1), "s"), true)
            .await
            .unwrap();
        let original = backend.get("auth", "k").await.unwrap().unwrap();

        let unstamped = Document {
            key: "k".to_string(),
            value: json!(2),
            session: "s".to_string(),
            created_at: None,
        };
        backend.put("auth", unstamped, true).await.unwrap();

        let read = backend.get("auth", "k").await.unwrap().unwrap();
        assert_eq!(read.value, json!(2));
        assert_eq!(read.created_at, original.created_at);
    }

    #[tokio::test]
    async fn test_delete_where_session() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        backend
            .put("auth", Document::new("s1-creds", json!(0), "s1"), true)
            .await
            .unwrap();
        backend
            .put("auth", Document::new("s1-pre-key-5", json!(1), "s1"), true)
            .await
            .unwrap();
        backend
            .put("auth", Document::new("s2-pre-key-5", json!(2), "s2"), true)
            .await
            .unwrap();

        backend
            .delete_where_session("auth", "s1", Some("s1-creds"))
            .await
            .unwrap();

        assert!(backend.get("auth", "s1-creds").await.unwrap().is_some());
        assert!(backend.get("auth", "s1-pre-key-5").await.unwrap().is_none());
        assert!(backend.get("auth", "s2-pre-key-5").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_where_session_missing_table_is_ok() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        backend
            .delete_where_session("never-created", "s", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_skips_unparseable_files() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        backend
            .put("auth", Document::new("s1-session-a", json!(1), "s1"), true)
            .await
            .unwrap();
        std::fs::write(dir.path().join("auth").join("junk.json"), b"not json").unwrap();

        backend.delete_where_session("auth", "s1", None).await.unwrap();
        assert!(backend.get("auth", "s1-session-a").await.unwrap().is_none());
        // The junk file was skipped, not fatal.
        assert!(dir.path().join("auth").join("junk.json").exists());
    }

    #[tokio::test]
    async fn test_path_escape_is_rejected() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        for key in ["..", "a/b", "a\\b", ""] {
            let result = backend.get("auth", key).await;
            assert!(
                matches!(result, Err(BackendError::InvalidKey(_))),
                "key {key:?} must be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_behind() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        backend
            .put("auth", Document::new("k", json!(1), "s"), true)
            .await
            .unwrap();
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("auth"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
