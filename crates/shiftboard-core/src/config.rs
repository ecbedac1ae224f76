//! Shiftboard configuration
//!
//! Read from an optional TOML file, then overridden by environment variables:
//! - `SHIFTBOARD_ACCESS_CODE`
//! - `SHIFTBOARD_DATA_DIR`
//! - `SHIFTBOARD_LOG`
//! - `SHIFTBOARD_LOG_JSON`

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable overriding the shared access code
pub const ENV_ACCESS_CODE: &str = "SHIFTBOARD_ACCESS_CODE";
/// Environment variable overriding the data directory
pub const ENV_DATA_DIR: &str = "SHIFTBOARD_DATA_DIR";
/// Environment variable overriding the log filter
pub const ENV_LOG: &str = "SHIFTBOARD_LOG";
/// Environment variable switching log output to JSON lines
pub const ENV_LOG_JSON: &str = "SHIFTBOARD_LOG_JSON";

/// Engine and binary configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftboardConfig {
    /// Shared secret unlocking mutations; when unset no code is accepted
    pub access_code: Option<String>,
    /// Directory holding the week store, session slot and identity
    pub data_dir: PathBuf,
    /// Advisory site names offered for autocomplete
    pub known_sites: Vec<String>,
    /// `tracing` filter directive
    pub log_filter: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl ShiftboardConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With shared access code
    #[inline]
    #[must_use]
    pub fn with_access_code(mut self, code: impl Into<String>) -> Self {
        self.access_code = Some(code.into());
        self
    }

    /// With data directory
    #[inline]
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// With known sites
    #[inline]
    #[must_use]
    pub fn with_known_sites(mut self, sites: Vec<String>) -> Self {
        self.known_sites = sites;
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// If the text is not valid for this schema.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load `path` if given (defaults otherwise), then apply the process environment
    ///
    /// # Errors
    /// If the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        Ok(config.with_env(|name| std::env::var(name).ok()))
    }

    /// Apply overrides from `lookup`
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(code) = lookup(ENV_ACCESS_CODE).filter(|c| !c.is_empty()) {
            self.access_code = Some(code);
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|f| !f.is_empty()) {
            self.log_filter = filter;
        }
        if let Some(flag) = lookup(ENV_LOG_JSON) {
            self.log_json = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        self
    }

    /// JSON file holding every week document
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("weeks.json")
    }

    /// Durable session slot
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    /// Anonymous identity file
    #[must_use]
    pub fn identity_path(&self) -> PathBuf {
        self.data_dir.join("identity")
    }

    /// Known sites starting with `prefix`, case-insensitively
    #[must_use]
    pub fn site_suggestions(&self, prefix: &str) -> Vec<&str> {
        let prefix = prefix.to_lowercase();
        self.known_sites
            .iter()
            .filter(|site| site.to_lowercase().starts_with(&prefix))
            .map(String::as_str)
            .collect()
    }
}

impl Default for ShiftboardConfig {
    fn default() -> Self {
        Self {
            access_code: None,
            data_dir: PathBuf::from(".shiftboard"),
            known_sites: vec![
                "425 California".to_string(),
                "100 Pine".to_string(),
                "1 Market".to_string(),
            ],
            log_filter: "info".to_string(),
            log_json: false,
        }
    }
}

impl fmt::Debug for ShiftboardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShiftboardConfig")
            .field("access_code", &self.access_code.as_ref().map(|_| "<redacted>"))
            .field("data_dir", &self.data_dir)
            .field("known_sites", &self.known_sites)
            .field("log_filter", &self.log_filter)
            .field("log_json", &self.log_json)
            .finish()
    }
}
