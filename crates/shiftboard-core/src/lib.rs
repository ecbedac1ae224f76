//! Shiftboard Core - week document synchronization and mutation
//!
//! The engine behind a shared weekly shift board:
//! - [`ShiftRepository`] applies edits as read-modify-write transactions
//!   against one document per week
//! - [`LiveSyncController`] keeps the displayed week's projection current
//! - [`AccessGate`] decides whether this client may mutate at all
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use shiftboard_core::ShiftRepository;
//! use shiftboard_model::ShiftDraft;
//! use shiftboard_store::MemoryDocumentStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = ShiftRepository::new(Arc::new(MemoryDocumentStore::new()));
//! let day = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
//!
//! let shift = repo.add_shift(day, ShiftDraft::new("425 California", "0900", "1700")).await?;
//! let stored = repo.fetch_day(day).await?;
//! assert_eq!(stored.shift(&shift.id), Some(&shift));
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod access;
pub mod config;
pub mod error;
pub mod live_sync;
pub mod repository;

pub use access::AccessGate;
pub use config::ShiftboardConfig;
pub use error::{AccessError, ConfigError, RepositoryError};
pub use live_sync::{LiveSyncController, SyncState};
pub use repository::ShiftRepository;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Shiftboard Core
    pub use crate::{
        AccessError, AccessGate, LiveSyncController, RepositoryError, ShiftRepository,
        ShiftboardConfig, SyncState,
    };
    pub use shiftboard_model::{
        Color, ColorPair, DayRecord, Session, Shift, ShiftDraft, ShiftId, Week, WeekKey, WeekView,
    };
    pub use shiftboard_store::{DocumentStore, MemoryDocumentStore};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
