//! Durable local slot holding the access grant
//!
//! One named slot per profile, read and written synchronously.

use crate::error::SlotError;
use parking_lot::Mutex;
use shiftboard_model::Session;
use std::path::{Path, PathBuf};

/// Synchronous storage for at most one [`Session`]
pub trait SessionSlot: Send + Sync {
    /// Stored grant, if any
    ///
    /// # Errors
    /// If the slot exists but cannot be read or decoded.
    fn load(&self) -> Result<Option<Session>, SlotError>;

    /// Replace the stored grant
    ///
    /// # Errors
    /// If the slot cannot be written.
    fn store(&self, session: &Session) -> Result<(), SlotError>;

    /// Remove the stored grant
    ///
    /// # Errors
    /// If the slot cannot be cleared.
    fn clear(&self) -> Result<(), SlotError>;
}

/// Slot living only as long as the process
#[derive(Debug, Default)]
pub struct MemorySessionSlot {
    inner: Mutex<Option<Session>>,
}

impl MemorySessionSlot {
    /// Empty slot
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionSlot for MemorySessionSlot {
    fn load(&self) -> Result<Option<Session>, SlotError> {
        Ok(self.inner.lock().clone())
    }

    fn store(&self, session: &Session) -> Result<(), SlotError> {
        *self.inner.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SlotError> {
        *self.inner.lock() = None;
        Ok(())
    }
}

/// Slot persisted as a JSON file
#[derive(Debug, Clone)]
pub struct FileSessionSlot {
    path: PathBuf,
}

impl FileSessionSlot {
    /// Slot at `path`; the file is created on first store
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location on disk
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionSlot for FileSessionSlot {
    fn load(&self) -> Result<Option<Session>, SlotError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&self, session: &Session) -> Result<(), SlotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SlotError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
