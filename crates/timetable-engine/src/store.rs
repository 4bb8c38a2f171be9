//! Persistence contract for slots and assessments.
//!
//! The scheduler never talks to a database directly; it goes through these
//! traits so a hosted Postgres backend, a test double, or [`InMemoryStore`]
//! can sit behind it.
//!
//! [`InMemoryStore`]: crate::memory::InMemoryStore

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::assessment::{Assessment, AssessmentStatus};
use crate::error::StoreError;
use crate::slot::{ExamSlot, NewExamSlot, SlotPatch};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Row filter for [`SlotStore::select_slots`]. All set predicates must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotFilter {
    pub assessment_id: Option<String>,
    pub exam_date: Option<NaiveDate>,
    /// Inclusive lower bound on `exam_date`.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on `exam_date`.
    pub date_to: Option<NaiveDate>,
    pub room: Option<String>,
    pub batch_section: Option<String>,
    /// Slot's invigilator set contains this faculty id.
    pub invigilator: Option<String>,
    /// Slot id is one of these.
    pub ids: Option<BTreeSet<String>>,
}

impl SlotFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assessment(mut self, assessment_id: impl Into<String>) -> Self {
        self.assessment_id = Some(assessment_id.into());
        self
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.exam_date = Some(date);
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    pub fn batch(mut self, batch: impl Into<String>) -> Self {
        self.batch_section = Some(batch.into());
        self
    }

    pub fn invigilator(mut self, faculty_id: impl Into<String>) -> Self {
        self.invigilator = Some(faculty_id.into());
        self
    }

    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Evaluate the filter against one slot. Backends that cannot push a
    /// predicate down may post-filter with this.
    pub fn matches(&self, slot: &ExamSlot) -> bool {
        if let Some(id) = &self.assessment_id {
            if &slot.assessment_id != id {
                return false;
            }
        }
        if let Some(date) = self.exam_date {
            if slot.exam_date != date {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if slot.exam_date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if slot.exam_date > to {
                return false;
            }
        }
        if let Some(room) = &self.room {
            if slot.room() != Some(room.as_str()) {
                return false;
            }
        }
        if let Some(batch) = &self.batch_section {
            if slot.batch() != Some(batch.as_str()) {
                return false;
            }
        }
        if let Some(faculty) = &self.invigilator {
            if !slot.has_invigilator(faculty) {
                return false;
            }
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&slot.id) {
                return false;
            }
        }
        true
    }
}

/// Precondition on a guarded write: the slot must still be at `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionGuard {
    pub slot_id: String,
    pub version: u64,
}

impl From<&ExamSlot> for VersionGuard {
    fn from(slot: &ExamSlot) -> Self {
        Self {
            slot_id: slot.id.clone(),
            version: slot.version,
        }
    }
}

/// CRUD over exam-slot records.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Persist a new slot and assign its id. Invigilators start empty.
    async fn insert_slot(&self, data: NewExamSlot) -> StoreResult<ExamSlot>;

    /// Fetch one slot by id.
    async fn get_slot(&self, id: &str) -> StoreResult<ExamSlot>;

    /// All slots matching `filter`.
    async fn select_slots(&self, filter: &SlotFilter) -> StoreResult<Vec<ExamSlot>>;

    /// Apply `patch` to slot `id` and bump its version.
    ///
    /// The write and the check of every guard happen atomically: if any guarded
    /// slot is missing or at another version, nothing is written and
    /// [`StoreError::VersionMismatch`] is returned.
    async fn update_slot(
        &self,
        id: &str,
        patch: &SlotPatch,
        guards: &[VersionGuard],
    ) -> StoreResult<ExamSlot>;

    /// Remove slot `id`.
    async fn delete_slot(&self, id: &str) -> StoreResult<()>;
}

/// Access to the parent assessment records.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn insert_assessment(&self, assessment: Assessment) -> StoreResult<Assessment>;

    async fn get_assessment(&self, id: &str) -> StoreResult<Assessment>;

    /// Compare-and-set the status from `from` to `to` in one atomic write.
    ///
    /// Fails with [`StoreError::StatusMismatch`] when the current status is not
    /// `from`.
    async fn transition_status(
        &self,
        id: &str,
        from: AssessmentStatus,
        to: AssessmentStatus,
    ) -> StoreResult<Assessment>;
}
