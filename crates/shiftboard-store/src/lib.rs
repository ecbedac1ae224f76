//! Shiftboard Store
//!
//! Bindings for the collaborators the engine talks to:
//! - [`DocumentStore`]: get / merge-write / subscribe, one document per week
//! - [`MemoryDocumentStore`] and [`JsonFileStore`] implementations
//! - [`SessionSlot`]: durable local slot for the access grant
//! - [`IdentityProvider`]: anonymous per-profile identity

#![warn(unreachable_pub)]

pub mod document_store;
pub mod error;
pub mod identity;
pub mod json_file;
pub mod memory;
pub mod session_slot;

pub use document_store::{merge_into, DocumentStore, Snapshot, Subscription};
pub use error::{SlotError, StoreError};
pub use identity::{FileIdentity, IdentityProvider, StaticIdentity};
pub use json_file::JsonFileStore;
pub use memory::MemoryDocumentStore;
pub use session_slot::{FileSessionSlot, MemorySessionSlot, SessionSlot};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
