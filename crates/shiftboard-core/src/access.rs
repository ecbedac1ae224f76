//! Access gate
//!
//! Mutation rights come from a one-time check of a shared code. The resulting
//! [`Session`] lives in the local slot and stays valid only while the
//! anonymous identity it was bound to is still live.
//!
//! The gate is advisory. Callers check [`AccessGate::can_mutate`] before
//! invoking repository mutations; the repository itself does not re-check.

use crate::error::AccessError;
use shiftboard_model::{IdentityToken, Session};
use shiftboard_store::{IdentityProvider, SessionSlot};
use std::fmt;
use std::sync::Arc;

/// Decides who may mutate the shared week documents
pub struct AccessGate {
    slot: Arc<dyn SessionSlot>,
    identity: Arc<dyn IdentityProvider>,
    access_code: Option<String>,
}

impl AccessGate {
    /// Create gate; with no `access_code` every grant attempt fails
    #[must_use]
    pub fn new(
        slot: Arc<dyn SessionSlot>,
        identity: Arc<dyn IdentityProvider>,
        access_code: Option<String>,
    ) -> Self {
        Self {
            slot,
            identity,
            access_code,
        }
    }

    /// The live anonymous identity, if any
    #[must_use]
    pub fn live_identity(&self) -> Option<IdentityToken> {
        self.identity.current()
    }

    /// Check `code` and, on success, store a grant bound to `identity`
    ///
    /// # Errors
    /// - `AccessError::InvalidCode` if `code` is not the shared secret; nothing
    ///   else about the request is reported
    /// - `AccessError::NoIdentity` if there is no identity to bind to
    /// - `AccessError::Storage` if the slot cannot be written
    pub fn grant_access(
        &self,
        first_name: &str,
        last_name: &str,
        code: &str,
        identity: Option<IdentityToken>,
    ) -> Result<Session, AccessError> {
        let matches = self
            .access_code
            .as_deref()
            .is_some_and(|secret| codes_match(secret, code));
        if !matches {
            tracing::info!("access code rejected");
            return Err(AccessError::InvalidCode);
        }
        let owner = identity.ok_or(AccessError::NoIdentity)?;

        let session = Session::granted(first_name, last_name, owner);
        self.slot.store(&session)?;
        tracing::info!(initials = %session.initials, "access granted");
        Ok(session)
    }

    /// The stored grant, if it still belongs to the live identity
    ///
    /// A grant whose identity is gone or different is discarded from the slot.
    #[must_use]
    pub fn current_grant(&self) -> Option<Session> {
        let stored = match self.slot.load() {
            Ok(stored) => stored?,
            Err(err) => {
                tracing::warn!(error = %err, "session slot unreadable");
                return None;
            }
        };

        match self.identity.current() {
            Some(identity) if stored.is_owned_by(&identity) => Some(stored),
            live => {
                tracing::info!(
                    identity_present = live.is_some(),
                    "discarding grant bound to a stale identity"
                );
                if let Err(err) = self.slot.clear() {
                    tracing::warn!(error = %err, "failed to clear stale grant");
                }
                None
            }
        }
    }

    /// Whether the current grant allows mutations
    #[must_use]
    pub fn can_mutate(&self) -> bool {
        self.current_grant().is_some_and(|s| s.has_access)
    }
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("configured", &self.access_code.is_some())
            .finish_non_exhaustive()
    }
}

/// Compare without stopping at the first differing byte
fn codes_match(secret: &str, candidate: &str) -> bool {
    let (a, b) = (secret.as_bytes(), candidate.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
