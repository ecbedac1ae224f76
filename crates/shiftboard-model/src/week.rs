//! Week keying
//!
//! Every week document is filed under the key of the Sunday that opens it.
//! The numbering is frozen: existing documents live under these labels, so the
//! arithmetic below must not be "corrected" towards ISO-8601.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of calendar days in one week document
pub const DAYS_PER_WEEK: usize = 7;

/// Stable identifier of one Sunday-to-Saturday span, formatted `YYYY-Www`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekKey(String);

impl WeekKey {
    /// Key of the week containing `date`
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        let sunday = start_of_week(date);
        let days_since_jan1 = sunday.ordinal0();
        // Sunday is weekday 0, so Jan 1 sits `days_since_jan1` weekdays earlier.
        let jan1_offset = (7 - days_since_jan1 % 7) % 7;
        let week = (days_since_jan1 + jan1_offset + 1).div_ceil(7);
        Self(format!("{:04}-W{:02}", sunday.year(), week))
    }

    /// Borrow the key as the store's document identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WeekKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Error parsing a week key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed week key '{0}', expected YYYY-Www")]
pub struct WeekKeyParseError(pub String);

impl FromStr for WeekKey {
    type Err = WeekKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || WeekKeyParseError(s.to_string());
        let (year, week) = s.split_once("-W").ok_or_else(bad)?;
        let well_formed = year.len() == 4
            && week.len() == 2
            && year.bytes().all(|b| b.is_ascii_digit())
            && week.bytes().all(|b| b.is_ascii_digit());
        if !well_formed {
            return Err(bad());
        }
        match week.parse::<u32>() {
            Ok(1..=54) => Ok(Self(s.to_string())),
            _ => Err(bad()),
        }
    }
}

/// The Sunday on or before `date`
#[must_use]
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Shorthand for [`WeekKey::for_date`]
#[inline]
#[must_use]
pub fn week_key(date: NaiveDate) -> WeekKey {
    WeekKey::for_date(date)
}

/// The seven consecutive dates starting at `start`
#[must_use]
pub fn week_dates(start: NaiveDate) -> [NaiveDate; DAYS_PER_WEEK] {
    let mut dates = [start; DAYS_PER_WEEK];
    for (offset, slot) in (0i64..).zip(dates.iter_mut()) {
        *slot = start + Duration::days(offset);
    }
    dates
}

/// A resolved week: its key plus its opening Sunday
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Week {
    /// Document key
    pub key: WeekKey,
    /// Opening Sunday
    pub start: NaiveDate,
}

impl Week {
    /// Week containing `date`
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            key: WeekKey::for_date(date),
            start: start_of_week(date),
        }
    }

    /// Dates covered by this week, ascending
    #[inline]
    #[must_use]
    pub fn dates(&self) -> [NaiveDate; DAYS_PER_WEEK] {
        week_dates(self.start)
    }

    /// Whether `date` falls inside this week
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        start_of_week(date) == self.start
    }
}
