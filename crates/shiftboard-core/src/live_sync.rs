//! Live subscription for the displayed week
//!
//! `Idle -> Subscribing -> Synced <-> Error`
//!
//! [`LiveSyncController::set_active_week`] owns the subscription lifecycle:
//! the previous subscription is torn down (`Idle`) before the next one is
//! opened (`Subscribing`). Each snapshot replaces the published projection
//! wholesale. A subscription failure is terminal for that week; only a week
//! change or a new controller reconnects.
//!
//! [`LiveSyncController::watch`] holds the latest state only;
//! [`LiveSyncController::transitions`] replays every state in order.
//!
//! Mutations in flight for a week that is no longer displayed are not
//! cancelled; their results simply never reach this view.

use chrono::NaiveDate;
use futures::StreamExt;
use shiftboard_model::{Week, WeekDocument, WeekKey, WeekView};
use shiftboard_store::{DocumentStore, Snapshot, Subscription};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// What the UI should render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    /// No week selected
    Idle,
    /// Waiting for the first snapshot of `week`
    Subscribing { week: WeekKey },
    /// Latest projection
    Synced(WeekView),
    /// Failure for `week`
    Error { week: WeekKey, message: String },
}

impl SyncState {
    /// Short label for logs
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            SyncState::Idle => "idle",
            SyncState::Subscribing { .. } => "subscribing",
            SyncState::Synced(_) => "synced",
            SyncState::Error { .. } => "error",
        }
    }

    /// Projection, when synced
    #[must_use]
    pub fn view(&self) -> Option<&WeekView> {
        match self {
            SyncState::Synced(view) => Some(view),
            _ => None,
        }
    }
}

/// Transitions a lagging [`LiveSyncController::transitions`] receiver may fall behind by
pub const TRANSITION_BACKLOG: usize = 64;

struct ActiveWeek {
    week: Week,
    task: Option<JoinHandle<()>>,
}

/// Keeps one week's projection current
pub struct LiveSyncController {
    store: Arc<dyn DocumentStore>,
    state: Arc<watch::Sender<SyncState>>,
    events: broadcast::Sender<SyncState>,
    /// Bumped on every teardown; listeners from older generations go quiet
    generation: Arc<AtomicU64>,
    active: Option<ActiveWeek>,
}

impl LiveSyncController {
    /// Create an idle controller over `store`
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        let (events, _) = broadcast::channel(TRANSITION_BACKLOG);
        Self {
            store,
            state: Arc::new(state),
            events,
            generation: Arc::new(AtomicU64::new(0)),
            active: None,
        }
    }

    /// Receiver of every published state
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Receiver of every transition from now on, in publication order
    ///
    /// A receiver more than `TRANSITION_BACKLOG` states behind skips the oldest.
    #[must_use]
    pub fn transitions(&self) -> broadcast::Receiver<SyncState> {
        self.events.subscribe()
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Key of the displayed week
    #[must_use]
    pub fn active_week(&self) -> Option<&WeekKey> {
        self.active.as_ref().map(|a| &a.week.key)
    }

    /// Display the week containing `date`
    ///
    /// Re-selecting the displayed week is a no-op, including after an error.
    /// Must be called within a tokio runtime.
    pub fn set_active_week(&mut self, date: NaiveDate) {
        let week = Week::containing(date);
        if self.active_week() == Some(&week.key) {
            return;
        }

        self.teardown();
        let generation = self.generation.load(Ordering::SeqCst);
        self.transition(SyncState::Subscribing {
            week: week.key.clone(),
        });

        let task = match self.store.subscribe(week.key.as_str()) {
            Ok(subscription) => Some(tokio::spawn(follow(
                subscription,
                week.clone(),
                generation,
                Arc::clone(&self.state),
                self.events.clone(),
                Arc::clone(&self.generation),
            ))),
            Err(err) => {
                tracing::warn!(week = %week.key, error = %err, "subscribe failed");
                self.transition(SyncState::Error {
                    week: week.key.clone(),
                    message: err.to_string(),
                });
                None
            }
        };
        self.active = Some(ActiveWeek { week, task });
    }

    /// Tear down and stop publishing; receivers observe the channel closing
    pub fn dispose(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(active) = self.active.take() {
            if let Some(task) = active.task {
                task.abort();
            }
            tracing::debug!(week = %active.week.key, "unsubscribed");
            self.transition(SyncState::Idle);
        }
    }

    fn transition(&self, next: SyncState) {
        tracing::debug!(state = next.label(), "live sync transition");
        let _ = self.events.send(next.clone());
        self.state.send_replace(next);
    }
}

impl Drop for LiveSyncController {
    fn drop(&mut self) {
        if let Some(task) = self.active.as_mut().and_then(|a| a.task.take()) {
            task.abort();
        }
    }
}

impl fmt::Debug for LiveSyncController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSyncController")
            .field("active_week", &self.active_week())
            .field("state", &self.state.borrow().label())
            .finish_non_exhaustive()
    }
}

/// Project one snapshot, or describe why it cannot be shown
fn project(week: &Week, snapshot: Snapshot) -> Result<SyncState, SyncState> {
    let error = |message: String| SyncState::Error {
        week: week.key.clone(),
        message,
    };
    let raw = snapshot.map_err(|e| error(e.to_string()))?;
    match raw.as_ref().map(WeekDocument::from_raw).transpose() {
        Ok(doc) => Ok(SyncState::Synced(WeekView::project(week.clone(), doc.as_ref()))),
        // Malformed contents are shown as an error but the feed stays open.
        Err(e) => Ok(error(format!("malformed week document: {e}"))),
    }
}

/// Publish `next` unless the listener's generation has been torn down
fn publish(
    state: &watch::Sender<SyncState>,
    events: &broadcast::Sender<SyncState>,
    current: &AtomicU64,
    generation: u64,
    next: SyncState,
) -> bool {
    let mut next = Some(next);
    state.send_if_modified(|slot| {
        if current.load(Ordering::SeqCst) != generation {
            return false;
        }
        if let Some(next) = next.take() {
            let _ = events.send(next.clone());
            *slot = next;
        }
        true
    });
    current.load(Ordering::SeqCst) == generation
}

async fn follow(
    mut subscription: Subscription,
    week: Week,
    generation: u64,
    state: Arc<watch::Sender<SyncState>>,
    events: broadcast::Sender<SyncState>,
    current: Arc<AtomicU64>,
) {
    while let Some(snapshot) = subscription.next().await {
        match project(&week, snapshot) {
            Ok(next) => {
                if !publish(&state, &events, &current, generation, next) {
                    return;
                }
            }
            Err(failure) => {
                tracing::warn!(week = %week.key, "live subscription failed");
                publish(&state, &events, &current, generation, failure);
                return;
            }
        }
    }
    publish(
        &state,
        &events,
        &current,
        generation,
        SyncState::Error {
            week: week.key.clone(),
            message: "subscription ended".to_string(),
        },
    );
}
