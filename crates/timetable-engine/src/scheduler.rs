//! Timetable orchestration over a slot/assessment store.
//!
//! Two tiers of conflict checking:
//!
//! - invigilator assignment runs a single-faculty check against the store
//!   before writing, and rejects the assignment outright on overlap;
//! - publication re-runs [`detect_conflicts`] over every slot of the assessment
//!   and only moves the assessment from `scheduled` to `ongoing` when the result
//!   is empty.
//!
//! Slot creation and editing perform no conflict check; a draft timetable may
//! hold conflicts until it is published.

use chrono::{Local, NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use crate::assessment::AssessmentStatus;
use crate::config::SchedulerConfig;
use crate::conflict::{detect_conflicts, faculty_conflicts, summarize, Conflict};
use crate::error::{Result, StoreError, TimetableError};
use crate::freebusy::{find_first_free_window, find_free_windows, FreeWindow, Resource};
use crate::slot::{validate_interval, ExamSlot, NewExamSlot, SlotPatch};
use crate::store::{AssessmentStore, SlotFilter, SlotStore, VersionGuard};
use crate::summary::TimetableSummary;

/// Creates, edits, staffs, and publishes exam timetables.
pub struct TimetableScheduler<S> {
    store: S,
    config: SchedulerConfig,
}

impl<S> TimetableScheduler<S>
where
    S: SlotStore + AssessmentStore,
{
    pub fn new(store: S) -> Self {
        Self::with_config(store, SchedulerConfig::default())
    }

    pub fn with_config(store: S, config: SchedulerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    // ── Slots ────────────────────────────────────────────────────────────────

    /// Validate and persist a new slot. No conflict check is done here.
    pub async fn create_slot(&self, data: NewExamSlot) -> Result<ExamSlot> {
        let data = self.prepare(data)?;
        self.ensure_mutable(&data.assessment_id, "create exam slot")
            .await?;

        let slot = self.store.insert_slot(data).await?;
        info!(
            slot_id = %slot.id,
            assessment_id = %slot.assessment_id,
            window = %slot.window_label(),
            "Exam slot created"
        );
        Ok(slot)
    }

    /// Create several slots. Every entry is validated before anything is written;
    /// a store failure stops the run and slots written before it are kept.
    pub async fn create_slots(&self, batch: Vec<NewExamSlot>) -> Result<Vec<ExamSlot>> {
        let prepared = batch
            .into_iter()
            .enumerate()
            .map(|(i, data)| {
                self.prepare(data).map_err(|e| match e {
                    TimetableError::Validation(msg) => {
                        TimetableError::Validation(format!("slot #{}: {msg}", i + 1))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut checked: Vec<&str> = Vec::new();
        for data in &prepared {
            if !checked.contains(&data.assessment_id.as_str()) {
                self.ensure_mutable(&data.assessment_id, "create exam slot")
                    .await?;
                checked.push(&data.assessment_id);
            }
        }

        let mut created = Vec::with_capacity(prepared.len());
        for data in prepared {
            created.push(self.store.insert_slot(data).await?);
        }
        info!(count = created.len(), "Exam slots created");
        Ok(created)
    }

    /// All slots of an assessment, ordered by date, start time, then room.
    pub async fn get_exam_slots(&self, assessment_id: &str) -> Result<Vec<ExamSlot>> {
        let mut slots = self
            .store
            .select_slots(&SlotFilter::new().assessment(assessment_id))
            .await?;
        slots.sort_by(|a, b| {
            (a.exam_date, a.start_time, a.room())
                .cmp(&(b.exam_date, b.start_time, b.room()))
        });
        debug!(assessment_id, count = slots.len(), "Loaded exam slots");
        Ok(slots)
    }

    /// Edit a slot's date, times, room, batch, or course fields.
    ///
    /// Invigilators cannot be changed here; use [`assign_invigilator`] and
    /// [`remove_invigilator`] so the faculty check always runs.
    ///
    /// [`assign_invigilator`]: Self::assign_invigilator
    /// [`remove_invigilator`]: Self::remove_invigilator
    pub async fn update_slot(&self, slot_id: &str, patch: SlotPatch) -> Result<ExamSlot> {
        if patch.invigilators.is_some() {
            return Err(TimetableError::validation(
                "invigilators are changed through assign_invigilator/remove_invigilator",
            ));
        }

        let current = self.store.get_slot(slot_id).await?;
        if patch.is_empty() {
            return Ok(current);
        }
        self.ensure_mutable(&current.assessment_id, "update exam slot")
            .await?;

        let mut preview = current.clone();
        patch.apply_to(&mut preview);
        validate_interval(preview.start_time, preview.end_time)?;
        self.check_date(preview.exam_date)?;

        let updated = self
            .store
            .update_slot(slot_id, &patch, &[VersionGuard::from(&current)])
            .await?;
        info!(slot_id, window = %updated.window_label(), "Exam slot updated");
        Ok(updated)
    }

    pub async fn delete_slot(&self, slot_id: &str) -> Result<()> {
        let slot = self.store.get_slot(slot_id).await?;
        self.ensure_mutable(&slot.assessment_id, "delete exam slot")
            .await?;
        self.store.delete_slot(slot_id).await?;
        info!(slot_id, assessment_id = %slot.assessment_id, "Exam slot deleted");
        Ok(())
    }

    // ── Invigilators ─────────────────────────────────────────────────────────

    /// Add `faculty_id` to a slot's invigilators unless that faculty member
    /// already supervises an overlapping slot on the same date.
    ///
    /// The write is guarded by the version of every same-day slot that was
    /// read for the check, so a concurrent assignment on that day forces the
    /// check to run again instead of slipping past it.
    pub async fn assign_invigilator(&self, slot_id: &str, faculty_id: &str) -> Result<()> {
        let faculty_id = faculty_id.trim();
        if faculty_id.is_empty() {
            return Err(TimetableError::validation("faculty_id must not be empty"));
        }

        let attempts = self.config.max_assign_attempts.max(1);
        let mut attempt = 1;
        loop {
            let target = self.store.get_slot(slot_id).await?;
            self.ensure_mutable(&target.assessment_id, "assign invigilator")
                .await?;

            let same_day = self
                .store
                .select_slots(&SlotFilter::new().on_date(target.exam_date))
                .await?;
            // Prefer the later read of the target so the guard and the patch agree.
            let target = same_day
                .iter()
                .find(|s| s.id == target.id)
                .cloned()
                .unwrap_or(target);

            let conflicts = faculty_conflicts(&target, &same_day, faculty_id);
            if !conflicts.is_empty() {
                warn!(
                    slot_id,
                    faculty_id,
                    conflicts = conflicts.len(),
                    "Invigilator assignment rejected"
                );
                return Err(TimetableError::Conflict {
                    message: format!(
                        "faculty already assigned to another exam at this time ({})",
                        summarize(&conflicts, self.config.conflict_preview_limit)
                    ),
                    conflicts,
                });
            }

            if target.has_invigilator(faculty_id) {
                debug!(slot_id, faculty_id, "Invigilator already assigned");
                return Ok(());
            }

            let mut invigilators = target.invigilators.clone();
            invigilators.insert(faculty_id.to_string());
            let patch = SlotPatch::default().invigilators(invigilators);

            let mut guards: Vec<VersionGuard> = same_day.iter().map(VersionGuard::from).collect();
            if !same_day.iter().any(|s| s.id == target.id) {
                guards.push(VersionGuard::from(&target));
            }

            match self.store.update_slot(&target.id, &patch, &guards).await {
                Ok(_) => {
                    info!(slot_id, faculty_id, "Invigilator assigned");
                    return Ok(());
                }
                Err(StoreError::VersionMismatch {
                    slot_id: changed, ..
                }) if attempt < attempts => {
                    warn!(
                        slot_id,
                        faculty_id,
                        changed_slot = %changed,
                        attempt,
                        "Same-day slot changed during invigilator check, re-checking"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Remove `faculty_id` from a slot's invigilators.
    pub async fn remove_invigilator(&self, slot_id: &str, faculty_id: &str) -> Result<()> {
        let faculty_id = faculty_id.trim();
        let slot = self.store.get_slot(slot_id).await?;
        if !slot.has_invigilator(faculty_id) {
            return Err(TimetableError::NotFound {
                entity: "invigilator assignment",
                id: format!("{faculty_id} on slot {slot_id}"),
            });
        }
        self.ensure_mutable(&slot.assessment_id, "remove invigilator")
            .await?;

        let mut invigilators = slot.invigilators.clone();
        invigilators.remove(faculty_id);
        self.store
            .update_slot(
                slot_id,
                &SlotPatch::default().invigilators(invigilators),
                &[VersionGuard::from(&slot)],
            )
            .await?;
        info!(slot_id, faculty_id, "Invigilator removed");
        Ok(())
    }

    // ── Checking and publication ─────────────────────────────────────────────

    /// Run the full conflict scan over an assessment's slots without publishing.
    pub async fn check_timetable(&self, assessment_id: &str) -> Result<Vec<Conflict>> {
        let slots = self.get_exam_slots(assessment_id).await?;
        let conflicts = detect_conflicts(&slots);
        debug!(
            assessment_id,
            slots = slots.len(),
            conflicts = conflicts.len(),
            "Timetable checked"
        );
        Ok(conflicts)
    }

    /// Move a `scheduled` assessment to `ongoing` if its timetable is conflict-free.
    ///
    /// The conflict scan has no side effects and the status change is one
    /// compare-and-set write, so a failed publish leaves nothing half-applied.
    pub async fn publish_timetable(&self, assessment_id: &str) -> Result<()> {
        let assessment = self.store.get_assessment(assessment_id).await?;
        let from = assessment.status;
        let to = match from.next() {
            Some(to) if from == AssessmentStatus::Scheduled => to,
            _ => {
                return Err(TimetableError::InvalidState {
                    assessment_id: assessment_id.to_string(),
                    status: from,
                    action: "publish timetable",
                })
            }
        };

        let slots = self.get_exam_slots(assessment_id).await?;
        if slots.is_empty() && !self.config.allow_empty_publish {
            return Err(TimetableError::validation(format!(
                "assessment {assessment_id} has no exam slots to publish"
            )));
        }

        let conflicts = detect_conflicts(&slots);
        if !conflicts.is_empty() {
            warn!(
                assessment_id,
                conflicts = conflicts.len(),
                "Timetable publication blocked"
            );
            return Err(TimetableError::Conflict {
                message: summarize(&conflicts, self.config.conflict_preview_limit),
                conflicts,
            });
        }

        self.store
            .transition_status(assessment_id, from, to)
            .await
            .map_err(|e| match e {
                StoreError::StatusMismatch { found, .. } => TimetableError::InvalidState {
                    assessment_id: assessment_id.to_string(),
                    status: found,
                    action: "publish timetable",
                },
                other => other.into(),
            })?;

        info!(assessment_id, slots = slots.len(), status = %to, "Timetable published");
        Ok(())
    }

    /// Counts, coverage, and conflict totals for an assessment's timetable.
    pub async fn timetable_summary(&self, assessment_id: &str) -> Result<TimetableSummary> {
        let assessment = self.store.get_assessment(assessment_id).await?;
        let slots = self.get_exam_slots(assessment_id).await?;
        let conflicts = detect_conflicts(&slots);
        Ok(TimetableSummary::build(
            &assessment,
            &slots,
            &conflicts,
            self.config.allow_empty_publish,
        ))
    }

    /// Free windows of a room, batch, or faculty member across all assessments.
    pub async fn free_windows(
        &self,
        resource: &Resource,
        date: NaiveDate,
        day_start: NaiveTime,
        day_end: NaiveTime,
    ) -> Result<Vec<FreeWindow>> {
        validate_interval(day_start, day_end)?;
        let slots = self
            .store
            .select_slots(&SlotFilter::new().on_date(date))
            .await?;
        Ok(find_free_windows(&slots, resource, date, day_start, day_end))
    }

    /// Earliest free window of at least `min_duration_minutes` for a resource.
    pub async fn first_free_window(
        &self,
        resource: &Resource,
        date: NaiveDate,
        day_start: NaiveTime,
        day_end: NaiveTime,
        min_duration_minutes: i64,
    ) -> Result<Option<FreeWindow>> {
        validate_interval(day_start, day_end)?;
        let slots = self
            .store
            .select_slots(&SlotFilter::new().on_date(date))
            .await?;
        Ok(find_first_free_window(
            &slots,
            resource,
            date,
            day_start,
            day_end,
            min_duration_minutes,
        ))
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn prepare(&self, data: NewExamSlot) -> Result<NewExamSlot> {
        let data = data.normalized();
        data.validate()?;
        self.check_date(data.exam_date)?;
        Ok(data)
    }

    fn check_date(&self, date: NaiveDate) -> Result<()> {
        if self.config.reject_past_dates && date < Local::now().date_naive() {
            return Err(TimetableError::validation(format!(
                "exam_date {date} is in the past"
            )));
        }
        Ok(())
    }

    async fn ensure_mutable(&self, assessment_id: &str, action: &'static str) -> Result<()> {
        if !self.config.enforce_assessment_lock {
            return Ok(());
        }
        let assessment = self.store.get_assessment(assessment_id).await?;
        if !self.config.is_mutable(assessment.status) {
            warn!(assessment_id, status = %assessment.status, action, "Assessment is locked");
            return Err(TimetableError::InvalidState {
                assessment_id: assessment_id.to_string(),
                status: assessment.status,
                action,
            });
        }
        Ok(())
    }
}
