//! Error types for the shiftboard engine
//!
//! Each failure has a fixed place it surfaces:
//! - Validation errors go back to the form for correction
//! - Store failures abandon the mutation (logged) or put the live view into
//!   its error state
//! - A missing day is swallowed as a no-op
//! - Access failures show inline on the signup form
//!
//! Lost updates from concurrent writers are not errors and are never reported.

use shiftboard_model::{ValidationError, WeekKey};
use shiftboard_store::{SlotError, StoreError};

/// Failures of a read-modify-write against a week document
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Input rejected before touching the store
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Store unreachable; nothing was written
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Fetched document does not cover the target date
    #[error("day {date} not found in week {week}")]
    DayNotFound { week: String, date: String },

    /// Fetched document could not be decoded
    #[error("malformed week document {week}: {reason}")]
    MalformedDocument { week: String, reason: String },
}

impl RepositoryError {
    /// Whether the failure is a silent no-op rather than something to show
    #[inline]
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::DayNotFound { .. })
    }

    /// Whether the user may simply re-issue the action
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Classify a store failure on the document for `week`
    #[must_use]
    pub fn from_store(week: &WeekKey, err: StoreError) -> Self {
        match err {
            StoreError::Malformed(reason) => Self::MalformedDocument {
                week: week.to_string(),
                reason,
            },
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}

/// Access grant failures
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Code does not match the shared secret
    #[error("invalid-code")]
    InvalidCode,

    /// No anonymous identity to bind the grant to
    #[error("no-identity")]
    NoIdentity,

    /// Local slot could not be written
    #[error("session storage failed: {0}")]
    Storage(#[from] SlotError),
}

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for the config schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn day_not_found_is_silent() {
        let err = RepositoryError::DayNotFound {
            week: "2024-W24".into(),
            date: "2024-06-12".into(),
        };
        assert!(err.is_silent());
        assert!(!err.is_retryable());
    }

    #[test]
    fn store_errors_map_to_unavailable() {
        let week = WeekKey::from_str("2024-W24").unwrap();
        let err = RepositoryError::from_store(&week, StoreError::unavailable("offline"));
        assert!(matches!(err, RepositoryError::StoreUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn malformed_store_data_names_the_week() {
        let week = WeekKey::from_str("2024-W24").unwrap();
        let err = RepositoryError::from_store(&week, StoreError::Malformed("bad json".into()));
        assert_eq!(err.to_string(), "malformed week document 2024-W24: bad json");
        assert!(!err.is_retryable());
    }

    #[test]
    fn access_errors_display_their_codes() {
        assert_eq!(AccessError::InvalidCode.to_string(), "invalid-code");
        assert_eq!(AccessError::NoIdentity.to_string(), "no-identity");
    }
}
