//! Compute free windows for a room, batch, or invigilator on a given date.
//!
//! Collects the slots that occupy the resource, merges overlapping or adjacent
//! busy intervals, then returns the gaps between them within a daily window.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::slot::{hhmm, ExamSlot};

/// A schedulable resource that two slots cannot share at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Resource {
    Room(String),
    Batch(String),
    Faculty(String),
}

impl Resource {
    /// Build from a kind name (`room`, `batch`, `faculty`) and an identifier.
    pub fn from_parts(kind: &str, id: &str) -> Option<Self> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        match kind.trim().to_ascii_lowercase().as_str() {
            "room" => Some(Self::Room(id.to_string())),
            "batch" | "student_batch" => Some(Self::Batch(id.to_string())),
            "faculty" | "invigilator" => Some(Self::Faculty(id.to_string())),
            _ => None,
        }
    }

    /// Whether `slot` occupies this resource.
    pub fn is_used_by(&self, slot: &ExamSlot) -> bool {
        match self {
            Self::Room(room) => slot.room() == Some(room.as_str()),
            Self::Batch(batch) => slot.batch() == Some(batch.as_str()),
            Self::Faculty(faculty) => slot.has_invigilator(faculty),
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Room(id) => write!(f, "room {id}"),
            Self::Batch(id) => write!(f, "batch {id}"),
            Self::Faculty(id) => write!(f, "faculty {id}"),
        }
    }
}

/// A free interval within a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub duration_minutes: i64,
}

impl FreeWindow {
    fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start,
            end,
            duration_minutes: (end - start).num_minutes(),
        }
    }
}

/// Busy intervals of `resource` on `date`, clipped to the day window, sorted and
/// merged so that no two intervals overlap or touch.
pub fn busy_intervals(
    slots: &[ExamSlot],
    resource: &Resource,
    date: NaiveDate,
    day_start: NaiveTime,
    day_end: NaiveTime,
) -> Vec<(NaiveTime, NaiveTime)> {
    let mut intervals: Vec<(NaiveTime, NaiveTime)> = slots
        .iter()
        .filter(|s| s.exam_date == date && resource.is_used_by(s))
        .filter(|s| s.start_time < day_end && s.end_time > day_start)
        .map(|s| (s.start_time.max(day_start), s.end_time.min(day_end)))
        .collect();

    if intervals.is_empty() {
        return Vec::new();
    }

    intervals.sort();

    let mut merged: Vec<(NaiveTime, NaiveTime)> = Vec::new();
    for (start, end) in intervals {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    merged
}

/// Free windows for `resource` on `date` between `day_start` and `day_end`.
///
/// Returns an empty list when the day window itself is empty or inverted.
pub fn find_free_windows(
    slots: &[ExamSlot],
    resource: &Resource,
    date: NaiveDate,
    day_start: NaiveTime,
    day_end: NaiveTime,
) -> Vec<FreeWindow> {
    if day_start >= day_end {
        return Vec::new();
    }

    let mut free = Vec::new();
    let mut cursor = day_start;

    for (busy_start, busy_end) in busy_intervals(slots, resource, date, day_start, day_end) {
        if cursor < busy_start {
            free.push(FreeWindow::new(cursor, busy_start));
        }
        cursor = cursor.max(busy_end);
    }

    if cursor < day_end {
        free.push(FreeWindow::new(cursor, day_end));
    }

    free
}

/// The first free window of at least `min_duration_minutes`.
pub fn find_first_free_window(
    slots: &[ExamSlot],
    resource: &Resource,
    date: NaiveDate,
    day_start: NaiveTime,
    day_end: NaiveTime,
    min_duration_minutes: i64,
) -> Option<FreeWindow> {
    find_free_windows(slots, resource, date, day_start, day_end)
        .into_iter()
        .find(|w| w.duration_minutes >= min_duration_minutes)
}
