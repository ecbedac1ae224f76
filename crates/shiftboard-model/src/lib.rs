//! Shiftboard Model
//!
//! Data shared by every shiftboard client:
//! - Week keying (`YYYY-Www` keys, Sunday-to-Saturday spans)
//! - The week document: days, shifts, comments and notes
//! - The shift color palette
//! - The local access grant ([`Session`])
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use shiftboard_model::{week_key, Week};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
//! assert_eq!(week_key(date).as_str(), "2024-W24");
//! assert_eq!(Week::containing(date).dates().len(), 7);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod document;
pub mod palette;
pub mod session;
pub mod shift;
pub mod week;

pub use document::{DayRecord, Document, WeekDocument, WeekView, DAYS_FIELD};
pub use palette::{Color, ColorPair, UnknownColor};
pub use session::{initials_of, IdentityToken, Session};
pub use shift::{
    Annotation, Comment, EntryId, Note, Shift, ShiftDraft, ShiftId, ValidationError, MAX_INITIALS,
};
pub use week::{start_of_week, week_dates, week_key, Week, WeekKey, WeekKeyParseError, DAYS_PER_WEEK};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
