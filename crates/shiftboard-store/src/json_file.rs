//! Single-file JSON document store
//!
//! Keeps every week document in one pretty-printed JSON object on disk and
//! serves reads and subscriptions from memory. A write is persisted before it
//! is applied in memory, so a failed persist leaves both the file and the
//! subscribers on the previous state.

use crate::document_store::{merge_into, DocumentStore, Subscription};
use crate::error::StoreError;
use crate::memory::MemoryDocumentStore;
use async_trait::async_trait;
use shiftboard_model::Document;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// File-backed store for a single process
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    memory: MemoryDocumentStore,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    ///
    /// # Errors
    /// - `StoreError::Unavailable` if the file exists but cannot be read
    /// - `StoreError::Malformed` if it is not a JSON object of documents
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let documents: BTreeMap<String, Document> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %path.display(), documents = documents.len(), "opened json store");
        Ok(Self {
            path,
            memory: MemoryDocumentStore::with_documents(documents),
            write_lock: Mutex::new(()),
        })
    }

    /// Location on disk
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, documents: &BTreeMap<String, Document>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(documents)?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn fetch(&self, key: &str) -> Result<Option<Document>, StoreError> {
        self.memory.fetch(key).await
    }

    async fn merge_write(&self, key: &str, patch: Document) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut documents = self.memory.export();
        merge_into(documents.entry(key.to_string()).or_default(), patch.clone());
        self.persist(&documents).await?;
        self.memory.merge_write(key, patch).await
    }

    fn subscribe(&self, key: &str) -> Result<Subscription, StoreError> {
        self.memory.subscribe(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn patch(n: i64) -> Document {
        let mut doc = Document::new();
        doc.insert("days".to_string(), json!([n]));
        doc
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weeks.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        store.merge_write("2024-W24", patch(1)).await.unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let doc = reopened.fetch("2024-W24").await.unwrap().unwrap();
        assert_eq!(doc["days"], json!([1]));
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("nested/weeks.json"))
            .await
            .unwrap();
        assert_eq!(store.fetch("any").await.unwrap(), None);
        store.merge_write("any", patch(2)).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn garbage_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weeks.json");
        std::fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path).await,
            Err(StoreError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn subscribers_see_persisted_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("weeks.json")).await.unwrap();
        let mut sub = store.subscribe("k").unwrap();
        assert_eq!(sub.next_snapshot().await, Some(Ok(None)));
        store.merge_write("k", patch(3)).await.unwrap();
        let doc = sub.next_snapshot().await.unwrap().unwrap().unwrap();
        assert_eq!(doc["days"], json!([3]));
    }
}
