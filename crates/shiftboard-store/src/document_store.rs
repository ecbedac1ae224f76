//! The document store seam
//!
//! Three capabilities, one document per key:
//! - `fetch`: current value or `None`
//! - `merge_write`: shallow merge, top-level fields in the patch replace
//!   the stored value wholesale, absent fields are left alone
//! - `subscribe`: current value first, then every change in write order

use crate::error::StoreError;
use async_trait::async_trait;
use futures::Stream;
use shiftboard_model::Document;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// One delivery on a subscription: the document, its absence, or a failure
pub type Snapshot = Result<Option<Document>, StoreError>;

/// Persistent keyed document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the document under `key`
    async fn fetch(&self, key: &str) -> Result<Option<Document>, StoreError>;

    /// Shallow-merge `patch` into the document under `key`, creating it if absent
    ///
    /// The write is applied in full or not at all.
    async fn merge_write(&self, key: &str, patch: Document) -> Result<(), StoreError>;

    /// Watch the document under `key`
    ///
    /// The current value is queued before this returns. Dropping the
    /// subscription unsubscribes.
    fn subscribe(&self, key: &str) -> Result<Subscription, StoreError>;
}

/// Apply merge-write semantics to an in-memory document
pub fn merge_into(target: &mut Document, patch: Document) {
    for (field, value) in patch {
        target.insert(field, value);
    }
}

/// Live feed of snapshots for one key
///
/// Implements [`Stream`]; the stream ends when the store drops its side.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<Snapshot>,
    on_drop: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a receiver, running `on_drop` when the subscriber goes away
    pub fn new(
        receiver: mpsc::UnboundedReceiver<Snapshot>,
        on_drop: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            receiver,
            on_drop: Some(Box::new(on_drop)),
        }
    }

    /// Wrap a receiver with no teardown hook
    #[must_use]
    pub fn detached(receiver: mpsc::UnboundedReceiver<Snapshot>) -> Self {
        Self {
            receiver,
            on_drop: None,
        }
    }

    /// Wait for the next snapshot
    pub async fn next_snapshot(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Stop receiving
    pub fn unsubscribe(self) {}
}

impl Stream for Subscription {
    type Item = Snapshot;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(on_drop) = self.on_drop.take() {
            on_drop();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("has_teardown", &self.on_drop.is_some())
            .finish_non_exhaustive()
    }
}
