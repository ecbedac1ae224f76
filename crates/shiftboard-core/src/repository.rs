//! Read-modify-write engine over week documents
//!
//! Every mutation follows the same protocol:
//! 1. Fetch the target week's document, or synthesize seven blank days
//! 2. Find the day whose date matches the target date
//! 3. Change that day's shifts or notes in memory
//! 4. Merge-write the complete `days` sequence back in one call
//!
//! Step 4 replaces the whole sequence. Two clients editing the same week
//! concurrently race, and the later write silently wins. Reads always go to
//! the store, never to a live projection.

use crate::error::RepositoryError;
use chrono::NaiveDate;
use shiftboard_model::{
    ColorPair, Comment, DayRecord, Note, Session, Shift, ShiftDraft, ShiftId, Week, WeekDocument,
    WeekView,
};
use shiftboard_store::DocumentStore;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mutations and direct reads against the shared week documents
pub struct ShiftRepository {
    store: Arc<dyn DocumentStore>,
    /// One read-modify-write in flight per client
    writer: Mutex<()>,
}

impl ShiftRepository {
    /// Create repository over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            writer: Mutex::new(()),
        }
    }

    /// The seven days of the week containing `date`, read from the store
    ///
    /// # Errors
    /// - `RepositoryError::StoreUnavailable` if the fetch fails
    /// - `RepositoryError::MalformedDocument` if the document cannot be decoded
    pub async fn fetch_week(&self, date: NaiveDate) -> Result<WeekView, RepositoryError> {
        let week = Week::containing(date);
        let doc = self.fetch_document(&week).await?;
        Ok(WeekView::project(week, doc.as_ref()))
    }

    /// One day, read from the store
    ///
    /// # Errors
    /// As [`Self::fetch_week`].
    pub async fn fetch_day(&self, date: NaiveDate) -> Result<DayRecord, RepositoryError> {
        let view = self.fetch_week(date).await?;
        Ok(view
            .day(date)
            .cloned()
            .unwrap_or_else(|| DayRecord::empty(date)))
    }

    /// Append a new shift built from `draft` under a fresh id
    ///
    /// # Errors
    /// - `RepositoryError::Validation` before any store access if the draft is malformed
    /// - otherwise as [`Self::update_shift`]
    pub async fn add_shift(
        &self,
        date: NaiveDate,
        draft: ShiftDraft,
    ) -> Result<Shift, RepositoryError> {
        draft.validate()?;
        self.append_shift(date, draft, "add_shift").await
    }

    /// Replace the stored shift sharing `shift.id`; silently does nothing if it is gone
    ///
    /// Fields are stored as given. Pasted shifts never passed validation, so
    /// recoloring them must not depend on it.
    ///
    /// # Errors
    /// - `RepositoryError::StoreUnavailable` if fetch or write fails; nothing is written
    /// - `RepositoryError::DayNotFound` if the fetched document lacks `date`
    pub async fn update_shift(&self, date: NaiveDate, shift: &Shift) -> Result<(), RepositoryError> {
        self.mutate(date, "update_shift", |day| {
            let stored = day.shift_mut(&shift.id)?;
            *stored = shift.clone();
            Some(())
        })
        .await?;
        Ok(())
    }

    /// Remove the shift with `id`; absent ids are a no-op
    ///
    /// # Errors
    /// As [`Self::update_shift`].
    pub async fn delete_shift(&self, date: NaiveDate, id: &ShiftId) -> Result<(), RepositoryError> {
        self.mutate(date, "delete_shift", |day| {
            let before = day.shifts.len();
            day.shifts.retain(|s| &s.id != id);
            (day.shifts.len() != before).then_some(())
        })
        .await?;
        Ok(())
    }

    /// Detached copy of `shift` without its id, for pasting
    #[must_use]
    pub fn copy_shift(shift: &Shift) -> ShiftDraft {
        shift.to_draft()
    }

    /// Add a copy of `clipboard` under a fresh id, without re-validating it
    ///
    /// # Errors
    /// As [`Self::update_shift`].
    pub async fn paste_shift(
        &self,
        date: NaiveDate,
        clipboard: &ShiftDraft,
    ) -> Result<Shift, RepositoryError> {
        self.append_shift(date, clipboard.clone(), "paste_shift").await
    }

    /// Replace the day's notes with `notes`
    ///
    /// # Errors
    /// As [`Self::update_shift`].
    pub async fn set_day_notes(
        &self,
        date: NaiveDate,
        notes: Vec<Note>,
    ) -> Result<(), RepositoryError> {
        self.mutate(date, "set_day_notes", |day| {
            day.notes = notes;
            Some(())
        })
        .await?;
        Ok(())
    }

    /// Append a note authored by `session` to the day's notes
    ///
    /// # Errors
    /// As [`Self::update_shift`].
    pub async fn add_note(
        &self,
        date: NaiveDate,
        text: &str,
        session: &Session,
    ) -> Result<Note, RepositoryError> {
        let note = Note::authored(session, text);
        self.mutate(date, "add_note", |day| {
            day.notes.push(note.clone());
            Some(())
        })
        .await?;
        Ok(note)
    }

    /// Append a comment authored by `session` to shift `id`
    ///
    /// Returns `None` without writing if the shift no longer exists.
    ///
    /// # Errors
    /// As [`Self::update_shift`].
    pub async fn add_comment(
        &self,
        date: NaiveDate,
        id: &ShiftId,
        text: &str,
        session: &Session,
    ) -> Result<Option<Comment>, RepositoryError> {
        let comment = Comment::authored(session, text);
        self.mutate(date, "add_comment", |day| {
            day.shift_mut(id)?.comments.push(comment.clone());
            Some(comment)
        })
        .await
    }

    /// Color `shift` as complete, filling blank initials from `session`
    ///
    /// # Errors
    /// As [`Self::update_shift`].
    pub async fn mark_complete(
        &self,
        date: NaiveDate,
        shift: &Shift,
        session: &Session,
    ) -> Result<Shift, RepositoryError> {
        let mut marked = shift.clone();
        marked.set_colors(ColorPair::COMPLETE);
        if marked.initials.trim().is_empty() {
            marked.initials.clone_from(&session.initials);
        }
        self.update_shift(date, &marked).await?;
        Ok(marked)
    }

    /// Color `shift` as handed to operations
    ///
    /// # Errors
    /// As [`Self::update_shift`].
    pub async fn mark_ops(&self, date: NaiveDate, shift: &Shift) -> Result<Shift, RepositoryError> {
        self.recolor(date, shift, ColorPair::OPS).await
    }

    /// Restore the default colors of `shift`
    ///
    /// # Errors
    /// As [`Self::update_shift`].
    pub async fn clear_status(
        &self,
        date: NaiveDate,
        shift: &Shift,
    ) -> Result<Shift, RepositoryError> {
        self.recolor(date, shift, ColorPair::DEFAULT).await
    }

    async fn recolor(
        &self,
        date: NaiveDate,
        shift: &Shift,
        pair: ColorPair,
    ) -> Result<Shift, RepositoryError> {
        let mut recolored = shift.clone();
        recolored.set_colors(pair);
        self.update_shift(date, &recolored).await?;
        Ok(recolored)
    }

    async fn append_shift(
        &self,
        date: NaiveDate,
        draft: ShiftDraft,
        operation: &'static str,
    ) -> Result<Shift, RepositoryError> {
        let shift = Shift::from_draft(draft);
        self.mutate(date, operation, |day| {
            day.shifts.push(shift.clone());
            Some(())
        })
        .await?;
        Ok(shift)
    }

    async fn fetch_document(&self, week: &Week) -> Result<Option<WeekDocument>, RepositoryError> {
        let raw = self
            .store
            .fetch(week.key.as_str())
            .await
            .map_err(|e| RepositoryError::from_store(&week.key, e))?;
        raw.map(|raw| {
            WeekDocument::from_raw(&raw).map_err(|e| RepositoryError::MalformedDocument {
                week: week.key.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
    }

    /// Run one read-modify-write on the day at `date`
    ///
    /// `change` returns `None` when it left the day untouched; nothing is
    /// written in that case.
    async fn mutate<T>(
        &self,
        date: NaiveDate,
        operation: &'static str,
        change: impl FnOnce(&mut DayRecord) -> Option<T>,
    ) -> Result<Option<T>, RepositoryError> {
        let week = Week::containing(date);
        let _writer = self.writer.lock().await;

        let mut doc = match self.fetch_document(&week).await {
            Ok(doc) => doc.unwrap_or_else(|| WeekDocument::blank(&week)),
            Err(err) => {
                tracing::warn!(operation, week = %week.key, error = %err, "mutation abandoned");
                return Err(err);
            }
        };

        let Some(day) = doc.day_mut(date) else {
            tracing::debug!(operation, week = %week.key, %date, "day missing from document");
            return Err(RepositoryError::DayNotFound {
                week: week.key.to_string(),
                date: date.to_string(),
            });
        };

        let Some(outcome) = change(day) else {
            tracing::debug!(operation, week = %week.key, %date, "nothing to change");
            return Ok(None);
        };

        let patch = doc
            .days_patch()
            .map_err(|e| RepositoryError::MalformedDocument {
                week: week.key.to_string(),
                reason: e.to_string(),
            })?;

        if let Err(err) = self.store.merge_write(week.key.as_str(), patch).await {
            tracing::warn!(operation, week = %week.key, error = %err, "mutation abandoned");
            return Err(RepositoryError::from_store(&week.key, err));
        }

        tracing::info!(operation, week = %week.key, %date, "week document updated");
        Ok(Some(outcome))
    }
}

impl fmt::Debug for ShiftRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShiftRepository").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftboard_model::{week_key, IdentityToken};
    use shiftboard_store::MemoryDocumentStore;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn repo() -> (ShiftRepository, MemoryDocumentStore) {
        let store = MemoryDocumentStore::new();
        (ShiftRepository::new(Arc::new(store.clone())), store)
    }

    fn session() -> Session {
        Session::granted("Ada", "Lovelace", IdentityToken::from("anon"))
    }

    #[tokio::test]
    async fn empty_store_synthesizes_seven_days() {
        let (repo, store) = repo();
        let view = repo.fetch_week(d(2024, 6, 12)).await.unwrap();
        assert_eq!(view.week.key.as_str(), "2024-W24");
        assert_eq!(view.days.len(), 7);
        assert_eq!(view.days[0].date, d(2024, 6, 9));
        assert_eq!(view.days[6].date, d(2024, 6, 15));
        assert!(store.export().is_empty());
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_the_store() {
        let (repo, store) = repo();
        let err = repo
            .add_shift(d(2024, 6, 12), ShiftDraft::new("Dock", "900", "1700"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));
        assert!(store.export().is_empty());
    }

    #[tokio::test]
    async fn first_write_persists_all_seven_days() {
        let (repo, store) = repo();
        repo.add_shift(d(2024, 6, 12), ShiftDraft::new("Dock", "0900", "1700"))
            .await
            .unwrap();
        let raw = store.export();
        let doc = WeekDocument::from_raw(&raw[week_key(d(2024, 6, 12)).as_str()]).unwrap();
        assert_eq!(doc.days.len(), 7);
    }

    #[tokio::test]
    async fn no_op_update_does_not_write() {
        let (repo, store) = repo();
        let ghost = Shift::from_draft(ShiftDraft::new("Dock", "0900", "1700"));
        repo.update_shift(d(2024, 6, 12), &ghost).await.unwrap();
        assert!(store.export().is_empty());
    }

    #[tokio::test]
    async fn comments_are_appended_with_author_label() {
        let (repo, _) = repo();
        let date = d(2024, 6, 12);
        let shift = repo
            .add_shift(date, ShiftDraft::new("Dock", "0900", "1700"))
            .await
            .unwrap();
        let first = repo
            .add_comment(date, &shift.id, "late start", &session())
            .await
            .unwrap()
            .unwrap();
        repo.add_comment(date, &shift.id, "covered", &session())
            .await
            .unwrap();

        let day = repo.fetch_day(date).await.unwrap();
        let stored = day.shift(&shift.id).unwrap();
        assert_eq!(stored.comments.len(), 2);
        assert_eq!(stored.comments[0], first);
        assert_eq!(stored.comments[0].user, "Ada Lovelace (AL)");
        assert_eq!(stored.comments[1].text, "covered");
    }

    #[tokio::test]
    async fn comment_on_missing_shift_is_none() {
        let (repo, _) = repo();
        let result = repo
            .add_comment(d(2024, 6, 12), &ShiftId::from("gone"), "hi", &session())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn mark_complete_keeps_existing_initials() {
        let (repo, _) = repo();
        let date = d(2024, 6, 12);
        let shift = repo
            .add_shift(date, ShiftDraft::new("Dock", "0900", "1700").with_initials("ZZ"))
            .await
            .unwrap();
        let marked = repo.mark_complete(date, &shift, &session()).await.unwrap();
        assert_eq!(marked.initials, "ZZ");
        assert_eq!(marked.colors(), ColorPair::COMPLETE);
    }

    #[tokio::test]
    async fn clear_status_restores_defaults() {
        let (repo, _) = repo();
        let date = d(2024, 6, 12);
        let shift = repo
            .add_shift(date, ShiftDraft::new("Dock", "0900", "1700"))
            .await
            .unwrap();
        let ops = repo.mark_ops(date, &shift).await.unwrap();
        assert_eq!(ops.colors(), ColorPair::OPS);
        repo.clear_status(date, &ops).await.unwrap();
        let stored = repo.fetch_day(date).await.unwrap();
        assert_eq!(stored.shift(&shift.id).unwrap().colors(), ColorPair::DEFAULT);
    }
}
