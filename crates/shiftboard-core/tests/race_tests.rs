//! Concurrent writers on one week document
//!
//! Whole-sequence writes mean the last writer wins across clients. Within
//! one client, mutations are serialized and nothing is lost.

use pretty_assertions::assert_eq;
use shiftboard_core::ShiftRepository;
use shiftboard_model::ShiftDraft;
use shiftboard_store::{DocumentStore, MemoryDocumentStore};
use shiftboard_test_utils::{sample_draft, sample_session, wednesday, ScriptedStore};
use std::sync::Arc;
use tokio::sync::{Barrier, Notify};

#[tokio::test]
async fn test_stale_read_loses_concurrent_append() {
    let shared = MemoryDocumentStore::new();
    let inner: Arc<dyn DocumentStore> = Arc::new(shared.clone());

    // Both clients read the same version before either writes; A writes after B.
    let both_fetched = Arc::new(Barrier::new(2));
    let b_written = Arc::new(Notify::new());
    let client_a = ShiftRepository::new(Arc::new(
        ScriptedStore::new(inner.clone())
            .pause_after_fetch(both_fetched.clone())
            .wait_before_write(b_written.clone()),
    ));
    let client_b = ShiftRepository::new(Arc::new(
        ScriptedStore::new(inner)
            .pause_after_fetch(both_fetched)
            .signal_after_write(b_written),
    ));

    let (s2, s1) = tokio::join!(
        client_a.add_shift(wednesday(), ShiftDraft::new("100 Pine", "1300", "2100")),
        client_b.add_shift(wednesday(), sample_draft()),
    );
    let (s2, s1) = (s2.unwrap(), s1.unwrap());

    let reader = ShiftRepository::new(Arc::new(shared));
    let day = reader.fetch_day(wednesday()).await.unwrap();
    assert_eq!(day.shifts, vec![s2]);
    assert!(day.shift(&s1.id).is_none());
}

#[tokio::test]
async fn test_one_client_keeps_every_append() {
    let repo = Arc::new(ShiftRepository::new(Arc::new(MemoryDocumentStore::new())));

    let tasks: Vec<_> = (0..8)
        .map(|n| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move {
                let draft = ShiftDraft::new(format!("Site {n}"), "0800", "1600");
                repo.add_shift(wednesday(), draft).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let day = repo.fetch_day(wednesday()).await.unwrap();
    assert_eq!(day.shifts.len(), 8);
}

#[tokio::test]
async fn test_one_client_keeps_every_note() {
    let store = ScriptedStore::new(Arc::new(MemoryDocumentStore::new())).yield_after_fetch();
    let repo = ShiftRepository::new(Arc::new(store));
    let session = sample_session();

    let (first, second) = tokio::join!(
        repo.add_note(wednesday(), "first", &session),
        repo.add_note(wednesday(), "second", &session),
    );

    let notes = repo.fetch_day(wednesday()).await.unwrap().notes;
    assert_eq!(notes, vec![first.unwrap(), second.unwrap()]);
}
