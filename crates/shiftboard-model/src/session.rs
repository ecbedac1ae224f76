//! The local access grant
//!
//! A [`Session`] is created when the shared access code is accepted and then
//! lives in durable local storage. It is never written to the shared store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Anonymous per-browser identity the grant is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityToken(pub String);

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Access grant plus the display identity used to sign comments and notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub first_name: String,
    pub last_name: String,
    pub initials: String,
    pub has_access: bool,
    pub owner_id: IdentityToken,
}

impl Session {
    /// Grant access to a named user bound to `owner_id`
    #[must_use]
    pub fn granted(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        owner_id: IdentityToken,
    ) -> Self {
        let first_name = first_name.into().trim().to_string();
        let last_name = last_name.into().trim().to_string();
        let initials = initials_of(&first_name, &last_name);
        Self {
            first_name,
            last_name,
            initials,
            has_access: true,
            owner_id,
        }
    }

    /// Label stamped on comments and notes, e.g. `Ada Lovelace (AL)`
    #[must_use]
    pub fn author_label(&self) -> String {
        format!("{} {} ({})", self.first_name, self.last_name, self.initials)
    }

    /// Whether the grant belongs to `identity`
    #[inline]
    #[must_use]
    pub fn is_owned_by(&self, identity: &IdentityToken) -> bool {
        &self.owner_id == identity
    }
}

/// First letter of each name, uppercased
#[must_use]
pub fn initials_of(first_name: &str, last_name: &str) -> String {
    [first_name, last_name]
        .iter()
        .filter_map(|name| name.trim().chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}
