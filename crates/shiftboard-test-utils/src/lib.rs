//! Testing utilities for the shiftboard workspace
//!
//! Shared fixtures plus two store wrappers:
//! - [`ScriptedStore`] pauses between fetch and write to stage interleavings
//! - [`FlakyStore`] fails selected operations on demand

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::NaiveDate;
use shiftboard_model::{DayRecord, Document, IdentityToken, Session, ShiftDraft, WeekDocument};
use shiftboard_store::{DocumentStore, StoreError, Subscription};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Barrier, Notify};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

/// 2024-06-12, a Wednesday in week 2024-W24
pub fn wednesday() -> NaiveDate {
    date(2024, 6, 12)
}

pub fn sample_draft() -> ShiftDraft {
    ShiftDraft::new("425 California", "0900", "1700")
}

pub fn sample_session() -> Session {
    Session::granted("Ada", "Lovelace", IdentityToken::from("anon-test"))
}

/// Raw document holding exactly `days`
pub fn raw_document(days: Vec<DayRecord>) -> Document {
    WeekDocument { days }
        .days_patch()
        .expect("fixture days serialize")
}

/// Store wrapper that can hold a client between its fetch and its write
pub struct ScriptedStore {
    inner: Arc<dyn DocumentStore>,
    after_fetch: Option<Arc<Barrier>>,
    yield_after_fetch: bool,
    before_write: Option<Arc<Notify>>,
    after_write: Option<Arc<Notify>>,
}

impl ScriptedStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            after_fetch: None,
            yield_after_fetch: false,
            before_write: None,
            after_write: None,
        }
    }

    /// Wait on `barrier` after every fetch
    #[must_use]
    pub fn pause_after_fetch(mut self, barrier: Arc<Barrier>) -> Self {
        self.after_fetch = Some(barrier);
        self
    }

    /// Hand control back to the scheduler after every fetch
    #[must_use]
    pub fn yield_after_fetch(mut self) -> Self {
        self.yield_after_fetch = true;
        self
    }

    /// Wait for `notify` before every write
    #[must_use]
    pub fn wait_before_write(mut self, notify: Arc<Notify>) -> Self {
        self.before_write = Some(notify);
        self
    }

    /// Signal `notify` after every write
    #[must_use]
    pub fn signal_after_write(mut self, notify: Arc<Notify>) -> Self {
        self.after_write = Some(notify);
        self
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn fetch(&self, key: &str) -> Result<Option<Document>, StoreError> {
        let doc = self.inner.fetch(key).await;
        if let Some(barrier) = &self.after_fetch {
            barrier.wait().await;
        }
        if self.yield_after_fetch {
            tokio::task::yield_now().await;
        }
        doc
    }

    async fn merge_write(&self, key: &str, patch: Document) -> Result<(), StoreError> {
        if let Some(notify) = &self.before_write {
            notify.notified().await;
        }
        let result = self.inner.merge_write(key, patch).await;
        if let Some(notify) = &self.after_write {
            notify.notify_one();
        }
        result
    }

    fn subscribe(&self, key: &str) -> Result<Subscription, StoreError> {
        self.inner.subscribe(key)
    }
}

/// Store wrapper whose operations can be switched to fail
pub struct FlakyStore {
    inner: Arc<dyn DocumentStore>,
    fail_fetch: AtomicBool,
    fail_write: AtomicBool,
    fail_subscribe: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            fail_fetch: AtomicBool::new(false),
            fail_write: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_write.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subscriptions(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Successful writes so far
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn offline() -> StoreError {
        StoreError::unavailable("simulated outage")
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn fetch(&self, key: &str) -> Result<Option<Document>, StoreError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Self::offline());
        }
        self.inner.fetch(key).await
    }

    async fn merge_write(&self, key: &str, patch: Document) -> Result<(), StoreError> {
        if self.fail_write.load(Ordering::SeqCst) {
            return Err(Self::offline());
        }
        self.inner.merge_write(key, patch).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&self, key: &str) -> Result<Subscription, StoreError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(Self::offline());
        }
        self.inner.subscribe(key)
    }
}
