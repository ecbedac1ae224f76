//! In-process document store
//!
//! All documents and subscriber channels sit behind one lock, so a write and
//! the fan-out of its snapshot are a single step: subscribers see changes in
//! exactly the order they were applied.

use crate::document_store::{merge_into, DocumentStore, Snapshot, Subscription};
use crate::error::StoreError;
use async_trait::async_trait;
use parking_lot::Mutex;
use shiftboard_model::Document;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;

#[derive(Debug)]
struct Subscriber {
    id: u64,
    sender: mpsc::UnboundedSender<Snapshot>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<String, Document>,
    subscribers: HashMap<String, Vec<Subscriber>>,
    next_subscriber: u64,
}

impl Inner {
    fn publish(&mut self, key: &str) {
        let Some(subscribers) = self.subscribers.get_mut(key) else {
            return;
        };
        let snapshot = self.documents.get(key).cloned();
        subscribers.retain(|s| s.sender.send(Ok(snapshot.clone())).is_ok());
    }
}

/// Shared in-memory store; clones are handles onto the same documents
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDocumentStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store preloaded with `documents`
    #[must_use]
    pub fn with_documents(documents: impl IntoIterator<Item = (String, Document)>) -> Self {
        let store = Self::new();
        store.inner.lock().documents.extend(documents);
        store
    }

    /// Copy of every document, ordered by key
    #[must_use]
    pub fn export(&self) -> BTreeMap<String, Document> {
        self.inner
            .lock()
            .documents
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of live subscriptions on `key`
    #[must_use]
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.inner
            .lock()
            .subscribers
            .get(key)
            .map_or(0, |subs| subs.iter().filter(|s| !s.sender.is_closed()).count())
    }

    /// End every subscription on `key` with an error, returning how many were closed
    pub fn close_subscriptions(&self, key: &str, reason: &str) -> usize {
        let removed = self.inner.lock().subscribers.remove(key).unwrap_or_default();
        let count = removed.len();
        for subscriber in removed {
            let _ = subscriber
                .sender
                .send(Err(StoreError::SubscriptionClosed(reason.to_string())));
        }
        if count > 0 {
            tracing::warn!(key, count, reason, "closed subscriptions");
        }
        count
    }

    fn unsubscribe(inner: &Weak<Mutex<Inner>>, key: &str, id: u64) {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let mut guard = inner.lock();
        if let Some(subs) = guard.subscribers.get_mut(key) {
            subs.retain(|s| s.id != id);
            if subs.is_empty() {
                guard.subscribers.remove(key);
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch(&self, key: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.inner.lock().documents.get(key).cloned())
    }

    async fn merge_write(&self, key: &str, patch: Document) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        merge_into(inner.documents.entry(key.to_string()).or_default(), patch);
        inner.publish(key);
        Ok(())
    }

    fn subscribe(&self, key: &str) -> Result<Subscription, StoreError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        let id = inner.next_subscriber;
        inner.next_subscriber += 1;

        let current = inner.documents.get(key).cloned();
        // Receiver is alive in this scope, so the initial send cannot fail.
        let _ = sender.send(Ok(current));
        inner
            .subscribers
            .entry(key.to_string())
            .or_default()
            .push(Subscriber { id, sender });
        drop(inner);

        let weak = Arc::downgrade(&self.inner);
        let key = key.to_string();
        Ok(Subscription::new(receiver, move || {
            Self::unsubscribe(&weak, &key, id);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn fetch_missing_is_none() {
        let store = MemoryDocumentStore::new();
        assert_eq!(store.fetch("2024-W24").await.unwrap(), None);
    }

    #[tokio::test]
    async fn merge_write_is_shallow() {
        let store = MemoryDocumentStore::new();
        store
            .merge_write("k", doc(json!({ "days": [1], "meta": "m" })))
            .await
            .unwrap();
        store.merge_write("k", doc(json!({ "days": [2] }))).await.unwrap();

        let stored = store.fetch("k").await.unwrap().unwrap();
        assert_eq!(stored["days"], json!([2]));
        assert_eq!(stored["meta"], "m");
    }

    #[tokio::test]
    async fn subscribe_delivers_current_then_changes_in_order() {
        let store = MemoryDocumentStore::new();
        let mut sub = store.subscribe("k").unwrap();
        assert_eq!(sub.next_snapshot().await, Some(Ok(None)));

        for n in 0..3 {
            store.merge_write("k", doc(json!({ "n": n }))).await.unwrap();
        }
        for n in 0..3 {
            let snapshot = sub.next_snapshot().await.unwrap().unwrap().unwrap();
            assert_eq!(snapshot["n"], n);
        }
    }

    #[tokio::test]
    async fn writes_to_other_keys_are_not_delivered() {
        let store = MemoryDocumentStore::new();
        let mut sub = store.subscribe("a").unwrap();
        let _ = sub.next_snapshot().await;
        store.merge_write("b", doc(json!({ "x": 1 }))).await.unwrap();
        store.merge_write("a", doc(json!({ "x": 2 }))).await.unwrap();
        let snapshot = sub.next_snapshot().await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot["x"], 2);
    }

    #[tokio::test]
    async fn dropping_subscription_unregisters() {
        let store = MemoryDocumentStore::new();
        let sub = store.subscribe("k").unwrap();
        assert_eq!(store.subscriber_count("k"), 1);
        drop(sub);
        assert_eq!(store.subscriber_count("k"), 0);
    }

    #[tokio::test]
    async fn closing_subscriptions_delivers_an_error() {
        let store = MemoryDocumentStore::new();
        let mut sub = store.subscribe("k").unwrap();
        let _ = sub.next_snapshot().await;
        assert_eq!(store.close_subscriptions("k", "revoked"), 1);
        assert!(matches!(
            sub.next_snapshot().await,
            Some(Err(StoreError::SubscriptionClosed(_)))
        ));
        assert_eq!(sub.next_snapshot().await, None);
    }

    #[test]
    fn export_is_key_ordered() {
        let store = MemoryDocumentStore::with_documents([
            ("b".to_string(), Document::new()),
            ("a".to_string(), Document::new()),
        ]);
        let keys: Vec<_> = store.export().into_keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
