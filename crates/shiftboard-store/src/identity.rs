//! Anonymous per-profile identity
//!
//! The identity only ties an access grant to "this profile". It proves
//! nothing to the shared store.

use parking_lot::RwLock;
use shiftboard_model::IdentityToken;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Source of the live anonymous identity
pub trait IdentityProvider: Send + Sync {
    /// Current identity, `None` once it has been invalidated
    fn current(&self) -> Option<IdentityToken>;
}

/// Identity held in memory and switchable at runtime
#[derive(Debug, Default)]
pub struct StaticIdentity {
    token: RwLock<Option<IdentityToken>>,
}

impl StaticIdentity {
    /// Provider returning `token`
    #[must_use]
    pub fn new(token: IdentityToken) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }

    /// Provider with no identity
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// Provider with a freshly generated identity
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(IdentityToken(Uuid::new_v4().to_string()))
    }

    /// Drop the identity
    pub fn invalidate(&self) {
        *self.token.write() = None;
    }

    /// Replace the identity
    pub fn replace(&self, token: IdentityToken) {
        *self.token.write() = Some(token);
    }
}

impl IdentityProvider for StaticIdentity {
    fn current(&self) -> Option<IdentityToken> {
        self.token.read().clone()
    }
}

/// Identity persisted in a small text file, minted on first use
#[derive(Debug)]
pub struct FileIdentity {
    path: PathBuf,
    cached: RwLock<Option<IdentityToken>>,
}

impl FileIdentity {
    /// Load the identity at `path`, creating one if none exists
    ///
    /// # Errors
    /// If the file cannot be read or created.
    pub fn load_or_create(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let token = match std::fs::read_to_string(&path) {
            Ok(contents) if !contents.trim().is_empty() => IdentityToken(contents.trim().to_string()),
            Ok(_) => Self::mint(&path)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::mint(&path)?,
            Err(err) => return Err(err),
        };
        Ok(Self {
            path,
            cached: RwLock::new(Some(token)),
        })
    }

    /// Location on disk
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the identity file; grants bound to it become void
    ///
    /// # Errors
    /// If the file exists but cannot be removed.
    pub fn invalidate(&self) -> std::io::Result<()> {
        *self.cached.write() = None;
        match std::fs::remove_file(&self.path) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }

    fn mint(path: &Path) -> std::io::Result<IdentityToken> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let token = IdentityToken(Uuid::new_v4().to_string());
        std::fs::write(path, &token.0)?;
        tracing::info!(path = %path.display(), "minted anonymous identity");
        Ok(token)
    }
}

impl IdentityProvider for FileIdentity {
    fn current(&self) -> Option<IdentityToken> {
        self.cached.read().clone()
    }
}
