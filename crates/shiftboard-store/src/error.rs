//! Error types for store bindings

/// Document store failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Store unreachable or misconfigured
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Persisted bytes could not be read as documents
    #[error("malformed store contents: {0}")]
    Malformed(String),

    /// Live subscription ended by the store
    #[error("subscription closed: {0}")]
    SubscriptionClosed(String),
}

impl StoreError {
    /// Create unavailable error
    #[inline]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Whether re-issuing the same request could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Local session slot failures
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    /// Underlying file access failed
    #[error("session slot I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Stored grant could not be decoded
    #[error("session slot corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
