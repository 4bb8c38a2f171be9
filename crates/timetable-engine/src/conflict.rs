//! Detect double-booked rooms, batches, and invigilators among exam slots.
//!
//! Performs a pairwise scan over a slot list. Two slots can only conflict when
//! they sit on the same date and their time intervals overlap. Adjacent slots
//! (where one ends exactly when another starts) are NOT conflicts.

use serde::{Deserialize, Serialize};

use crate::slot::ExamSlot;

/// The resource two overlapping slots both claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    Room,
    StudentBatch,
    Faculty,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::StudentBatch => "student_batch",
            Self::Faculty => "faculty",
        }
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected conflict between two slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictType,
    pub slot1: ExamSlot,
    pub slot2: ExamSlot,
    pub message: String,
    pub overlap_minutes: i64,
    /// Faculty ids on both slots, sorted. Empty for room and batch conflicts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_invigilators: Vec<String>,
}

impl Conflict {
    /// Ids of the two offending slots, in record order.
    pub fn slot_ids(&self) -> (&str, &str) {
        (&self.slot1.id, &self.slot2.id)
    }
}

/// Find every room, batch, and faculty conflict among `slots`.
///
/// Each overlapping pair yields one record per clashing dimension, so a pair can
/// produce up to three records. Faculty clashes produce a single record per pair
/// no matter how many invigilators are shared. Blank rooms and batches never match.
///
/// Input order only decides which slot is `slot1` (the earlier one).
pub fn detect_conflicts(slots: &[ExamSlot]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for (i, a) in slots.iter().enumerate() {
        for b in &slots[i + 1..] {
            if a.exam_date != b.exam_date {
                continue;
            }
            let Some(overlap_minutes) = a.overlap_minutes(b) else {
                continue;
            };

            if let (Some(room_a), Some(room_b)) = (a.room(), b.room()) {
                if room_a == room_b {
                    conflicts.push(Conflict {
                        kind: ConflictType::Room,
                        slot1: a.clone(),
                        slot2: b.clone(),
                        message: format!(
                            "Room {} is double-booked: {} overlaps {}",
                            room_a,
                            a.window_label(),
                            b.window_label()
                        ),
                        overlap_minutes,
                        shared_invigilators: Vec::new(),
                    });
                }
            }

            if let (Some(batch_a), Some(batch_b)) = (a.batch(), b.batch()) {
                if batch_a == batch_b {
                    conflicts.push(Conflict {
                        kind: ConflictType::StudentBatch,
                        slot1: a.clone(),
                        slot2: b.clone(),
                        message: format!(
                            "Batch {} has overlapping exams: {} overlaps {}",
                            batch_a,
                            a.window_label(),
                            b.window_label()
                        ),
                        overlap_minutes,
                        shared_invigilators: Vec::new(),
                    });
                }
            }

            // BTreeSet intersection is already sorted.
            let shared: Vec<String> = a
                .invigilators
                .intersection(&b.invigilators)
                .cloned()
                .collect();
            if !shared.is_empty() {
                conflicts.push(faculty_conflict(a, b, shared, overlap_minutes));
            }
        }
    }

    conflicts
}

/// Conflicts that would arise from adding `faculty_id` to `target`.
///
/// `others` may include `target` itself and slots on other dates; both are
/// skipped. Each overlapping slot already supervised by `faculty_id` yields one
/// faculty conflict with that slot as `slot1`.
pub fn faculty_conflicts(target: &ExamSlot, others: &[ExamSlot], faculty_id: &str) -> Vec<Conflict> {
    others
        .iter()
        .filter(|other| other.id != target.id)
        .filter(|other| other.exam_date == target.exam_date)
        .filter(|other| other.has_invigilator(faculty_id))
        .filter_map(|other| {
            other.overlap_minutes(target).map(|minutes| {
                faculty_conflict(other, target, vec![faculty_id.to_string()], minutes)
            })
        })
        .collect()
}

/// One-line description of a conflict list: the count plus the first `limit`
/// messages.
pub fn summarize(conflicts: &[Conflict], limit: usize) -> String {
    let noun = if conflicts.len() == 1 { "conflict" } else { "conflicts" };
    let shown: Vec<&str> = conflicts
        .iter()
        .take(limit)
        .map(|c| c.message.as_str())
        .collect();
    let mut text = format!("{} {} found", conflicts.len(), noun);
    if !shown.is_empty() {
        text.push_str(": ");
        text.push_str(&shown.join("; "));
    }
    if conflicts.len() > shown.len() {
        text.push_str(&format!(" (and {} more)", conflicts.len() - shown.len()));
    }
    text
}

fn faculty_conflict(
    a: &ExamSlot,
    b: &ExamSlot,
    shared: Vec<String>,
    overlap_minutes: i64,
) -> Conflict {
    Conflict {
        kind: ConflictType::Faculty,
        slot1: a.clone(),
        slot2: b.clone(),
        message: format!(
            "Faculty {} assigned to overlapping exams: {} overlaps {}",
            shared.join(", "),
            a.window_label(),
            b.window_label()
        ),
        overlap_minutes,
        shared_invigilators: shared,
    }
}
