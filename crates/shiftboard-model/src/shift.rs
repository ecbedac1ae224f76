//! Shifts and their annotations
//!
//! A [`Shift`] is one scheduled assignment on one day. Its `id` is minted when
//! the shift is created and never changes; every other field may be edited in
//! place. Comments and notes are [`Annotation`]s: immutable once written.

use crate::palette::{self, Color, ColorPair};
use crate::session::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ulid::Ulid;

/// Maximum length of a shift's initials
pub const MAX_INITIALS: usize = 4;

/// Opaque shift identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShiftId(pub String);

impl ShiftId {
    /// Mint a fresh identifier
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }
}

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShiftId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a comment or note
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    /// Mint a fresh identifier
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }
}

/// Authored, timestamped text attached to a shift or a day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique id
    pub id: EntryId,
    /// Author label captured at creation time
    pub user: String,
    /// Free text
    pub text: String,
    /// Creation timestamp
    pub date: DateTime<Utc>,
}

impl Annotation {
    /// Author a new annotation as `session`, stamped now
    #[must_use]
    pub fn authored(session: &Session, text: impl Into<String>) -> Self {
        Self {
            id: EntryId::generate(),
            user: session.author_label(),
            text: text.into(),
            date: Utc::now(),
        }
    }
}

/// Comment on a shift
pub type Comment = Annotation;

/// Note on a day
pub type Note = Annotation;

/// A scheduled assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    /// Immutable identity
    pub id: ShiftId,
    /// Site name, free text
    pub site: String,
    /// `HHMM`
    pub start_time: String,
    /// `HHMM`
    pub end_time: String,
    /// Assignee initials, possibly empty
    #[serde(default)]
    pub initials: String,
    /// Background fill; unknown names read as the default
    #[serde(default = "default_bg", deserialize_with = "decode_bg")]
    pub bg_color: Color,
    /// Font color; unknown names read as the default
    #[serde(default = "default_font", deserialize_with = "decode_font")]
    pub font_color: Color,
    /// Oldest first
    #[serde(default)]
    pub comments: Vec<Comment>,
}

fn default_bg() -> Color {
    ColorPair::DEFAULT.bg
}

fn default_font() -> Color {
    ColorPair::DEFAULT.font
}

fn decode_bg<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
    palette::decode_or(deserializer, default_bg())
}

fn decode_font<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
    palette::decode_or(deserializer, default_font())
}

impl Shift {
    /// Materialize a draft under a freshly minted id
    #[must_use]
    pub fn from_draft(draft: ShiftDraft) -> Self {
        Self {
            id: ShiftId::generate(),
            site: draft.site,
            start_time: draft.start_time,
            end_time: draft.end_time,
            initials: draft.initials,
            bg_color: draft.bg_color,
            font_color: draft.font_color,
            comments: draft.comments,
        }
    }

    /// Detached copy of every field except `id`
    #[must_use]
    pub fn to_draft(&self) -> ShiftDraft {
        ShiftDraft {
            site: self.site.clone(),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            initials: self.initials.clone(),
            bg_color: self.bg_color,
            font_color: self.font_color,
            comments: self.comments.clone(),
        }
    }

    /// Current fill/font pair
    #[inline]
    #[must_use]
    pub fn colors(&self) -> ColorPair {
        ColorPair {
            bg: self.bg_color,
            font: self.font_color,
        }
    }

    /// Overwrite fill and font
    #[inline]
    pub fn set_colors(&mut self, pair: ColorPair) {
        self.bg_color = pair.bg;
        self.font_color = pair.font;
    }

    /// Check the field invariants
    ///
    /// # Errors
    /// The first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.site, &self.start_time, &self.end_time, &self.initials)
    }
}

/// Shift contents without an identity: the input to add and the clipboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDraft {
    pub site: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub initials: String,
    #[serde(default = "default_bg")]
    pub bg_color: Color,
    #[serde(default = "default_font")]
    pub font_color: Color,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl ShiftDraft {
    /// Draft with default colors and no initials
    #[must_use]
    pub fn new(
        site: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            site: site.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            initials: String::new(),
            bg_color: ColorPair::DEFAULT.bg,
            font_color: ColorPair::DEFAULT.font,
            comments: Vec::new(),
        }
    }

    /// With assignee initials
    #[inline]
    #[must_use]
    pub fn with_initials(mut self, initials: impl Into<String>) -> Self {
        self.initials = initials.into();
        self
    }

    /// With a fill/font pair
    #[inline]
    #[must_use]
    pub fn with_colors(mut self, pair: ColorPair) -> Self {
        self.bg_color = pair.bg;
        self.font_color = pair.font;
        self
    }

    /// Check the field invariants
    ///
    /// # Errors
    /// The first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.site, &self.start_time, &self.end_time, &self.initials)
    }
}

/// Malformed shift input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Required field left blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Time not exactly four digits
    #[error("{field} must be four digits (HHMM), got '{value}'")]
    MalformedTime { field: &'static str, value: String },

    /// Initials longer than allowed
    #[error("initials may be at most 4 characters, got {0}")]
    InitialsTooLong(usize),
}

fn validate_fields(
    site: &str,
    start_time: &str,
    end_time: &str,
    initials: &str,
) -> Result<(), ValidationError> {
    if site.trim().is_empty() {
        return Err(ValidationError::MissingField("site"));
    }
    check_time("startTime", start_time)?;
    check_time("endTime", end_time)?;
    let initials_len = initials.chars().count();
    if initials_len > MAX_INITIALS {
        return Err(ValidationError::InitialsTooLong(initials_len));
    }
    Ok(())
}

fn check_time(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if value.len() != 4 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::MalformedTime {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
