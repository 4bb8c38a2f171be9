//! Readiness overview of one assessment's timetable.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::assessment::{Assessment, AssessmentStatus};
use crate::conflict::{Conflict, ConflictType};
use crate::slot::ExamSlot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableSummary {
    pub assessment_id: String,
    pub status: AssessmentStatus,
    pub slot_count: usize,
    /// Distinct exam dates, ascending.
    pub dates: Vec<NaiveDate>,
    pub room_count: usize,
    pub batch_count: usize,
    /// Slots with no invigilator assigned yet.
    pub unstaffed_slots: usize,
    pub room_conflicts: usize,
    pub batch_conflicts: usize,
    pub faculty_conflicts: usize,
    /// Whether `publish_timetable` would currently succeed.
    pub publishable: bool,
}

impl TimetableSummary {
    pub fn build(
        assessment: &Assessment,
        slots: &[ExamSlot],
        conflicts: &[Conflict],
        allow_empty_publish: bool,
    ) -> Self {
        let dates: BTreeSet<NaiveDate> = slots.iter().map(|s| s.exam_date).collect();
        let rooms: BTreeSet<&str> = slots.iter().filter_map(ExamSlot::room).collect();
        let batches: BTreeSet<&str> = slots.iter().filter_map(ExamSlot::batch).collect();
        let count = |kind: ConflictType| conflicts.iter().filter(|c| c.kind == kind).count();

        Self {
            assessment_id: assessment.id.clone(),
            status: assessment.status,
            slot_count: slots.len(),
            dates: dates.into_iter().collect(),
            room_count: rooms.len(),
            batch_count: batches.len(),
            unstaffed_slots: slots.iter().filter(|s| s.invigilators.is_empty()).count(),
            room_conflicts: count(ConflictType::Room),
            batch_conflicts: count(ConflictType::StudentBatch),
            faculty_conflicts: count(ConflictType::Faculty),
            publishable: assessment.status == AssessmentStatus::Scheduled
                && conflicts.is_empty()
                && (allow_empty_publish || !slots.is_empty()),
        }
    }

    pub fn conflict_count(&self) -> usize {
        self.room_conflicts + self.batch_conflicts + self.faculty_conflicts
    }
}
