//! Week documents and their projection
//!
//! The persisted document is `{ days: [ { date, shifts, notes }, ... ] }`.
//! Writers may leave days out; readers always see seven days in date order
//! through [`WeekView::project`].

use crate::shift::{Note, Shift, ShiftId};
use crate::week::{Week, DAYS_PER_WEEK};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw document as held by a store: a JSON object of top-level fields
pub type Document = Map<String, Value>;

/// Top-level field holding the day sequence
pub const DAYS_FIELD: &str = "days";

/// One calendar date's shifts and notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    /// ISO date, the join key
    pub date: NaiveDate,
    /// Keyed by shift id
    #[serde(default)]
    pub shifts: Vec<Shift>,
    /// Oldest first
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl DayRecord {
    /// Day with no shifts or notes
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            shifts: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Shift by id
    #[must_use]
    pub fn shift(&self, id: &ShiftId) -> Option<&Shift> {
        self.shifts.iter().find(|s| &s.id == id)
    }

    /// Mutable shift by id
    pub fn shift_mut(&mut self, id: &ShiftId) -> Option<&mut Shift> {
        self.shifts.iter_mut().find(|s| &s.id == id)
    }

    /// Shifts ordered by start time, for display
    #[must_use]
    pub fn shifts_by_start(&self) -> Vec<&Shift> {
        let mut shifts: Vec<&Shift> = self.shifts.iter().collect();
        shifts.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.site.cmp(&b.site)));
        shifts
    }
}

/// Typed view of a persisted week document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekDocument {
    #[serde(default)]
    pub days: Vec<DayRecord>,
}

impl WeekDocument {
    /// Seven empty days covering `week`
    #[must_use]
    pub fn blank(week: &Week) -> Self {
        Self {
            days: week.dates().into_iter().map(DayRecord::empty).collect(),
        }
    }

    /// Decode a raw store document
    ///
    /// # Errors
    /// If `days` is present but not shaped like a day sequence.
    pub fn from_raw(raw: &Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(raw.clone()))
    }

    /// The merge-write payload replacing the whole `days` field
    ///
    /// # Errors
    /// If a day fails to serialize.
    pub fn days_patch(&self) -> Result<Document, serde_json::Error> {
        let mut patch = Document::new();
        patch.insert(DAYS_FIELD.to_string(), serde_json::to_value(&self.days)?);
        Ok(patch)
    }

    /// Day matching `date`
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days.iter().find(|d| d.date == date)
    }

    /// Mutable day matching `date`
    pub fn day_mut(&mut self, date: NaiveDate) -> Option<&mut DayRecord> {
        self.days.iter_mut().find(|d| d.date == date)
    }
}

/// Seven days aligned to a week's dates: what a client renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekView {
    pub week: Week,
    pub days: Vec<DayRecord>,
}

impl WeekView {
    /// Align `doc` to the dates of `week`, synthesizing missing days
    ///
    /// Days in `doc` outside the week are dropped; if a date appears twice
    /// the first occurrence wins.
    #[must_use]
    pub fn project(week: Week, doc: Option<&WeekDocument>) -> Self {
        let mut days = Vec::with_capacity(DAYS_PER_WEEK);
        for date in week.dates() {
            let day = doc
                .and_then(|d| d.day(date))
                .cloned()
                .unwrap_or_else(|| DayRecord::empty(date));
            days.push(day);
        }
        Self { week, days }
    }

    /// Day matching `date`
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days.iter().find(|d| d.date == date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::shift::ShiftDraft;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn blank_covers_the_week() {
        let week = Week::containing(d(2024, 6, 12));
        let doc = WeekDocument::blank(&week);
        assert_eq!(doc.days.len(), DAYS_PER_WEEK);
        assert_eq!(doc.days[0].date, d(2024, 6, 9));
        assert!(doc.days.iter().all(|day| day.shifts.is_empty() && day.notes.is_empty()));
    }

    #[test]
    fn projection_fills_gaps_in_order() {
        let week = Week::containing(d(2024, 6, 12));
        let mut wed = DayRecord::empty(d(2024, 6, 12));
        wed.shifts.push(Shift::from_draft(ShiftDraft::new("Dock", "0900", "1700")));
        let doc = WeekDocument {
            days: vec![wed.clone(), DayRecord::empty(d(2024, 7, 1))],
        };

        let view = WeekView::project(week, Some(&doc));
        let dates: Vec<_> = view.days.iter().map(|day| day.date).collect();
        assert_eq!(dates, view.week.dates().to_vec());
        assert_eq!(view.day(d(2024, 6, 12)), Some(&wed));
        assert!(view.day(d(2024, 7, 1)).is_none());
    }

    #[test]
    fn raw_documents_decode_with_iso_dates() {
        let raw = json!({
            "days": [{ "date": "2024-06-12", "shifts": [], "notes": [] }],
            "owner": "ignored"
        });
        let Value::Object(raw) = raw else { unreachable!() };
        let doc = WeekDocument::from_raw(&raw).unwrap();
        assert_eq!(doc.days[0].date, d(2024, 6, 12));
    }

    #[test]
    fn days_patch_only_carries_days() {
        let week = Week::containing(d(2024, 6, 12));
        let patch = WeekDocument::blank(&week).days_patch().unwrap();
        assert_eq!(patch.len(), 1);
        assert_eq!(patch[DAYS_FIELD][0]["date"], "2024-06-09");
    }
}
