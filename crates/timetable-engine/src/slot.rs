//! Exam slot records: one scheduled sitting of a course's exam.
//!
//! Times are local wall-clock values without a timezone. A slot occupies the
//! half-open interval `[exam_date + start_time, exam_date + end_time)`.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};

/// A persisted exam slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSlot {
    pub id: String,
    pub assessment_id: String,
    pub exam_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_section: Option<String>,
    #[serde(default)]
    pub invigilators: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    /// Starts at 1 and is bumped by the store on every successful update.
    #[serde(default = "initial_version")]
    pub version: u64,
}

impl ExamSlot {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.exam_date.and_time(self.start_time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.exam_date.and_time(self.end_time)
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.ends_at() - self.starts_at()).num_minutes()
    }

    /// Room identifier, ignoring blank values. The value is not trimmed, so
    /// comparisons are exact string equality.
    pub fn room(&self) -> Option<&str> {
        non_blank(self.room.as_deref())
    }

    /// Batch/section identifier, ignoring blank values.
    pub fn batch(&self) -> Option<&str> {
        non_blank(self.batch_section.as_deref())
    }

    pub fn has_invigilator(&self, faculty_id: &str) -> bool {
        self.invigilators.contains(faculty_id)
    }

    /// Minutes shared by the two slots' intervals, or `None` when they do not
    /// overlap. Slots that touch (`a.end == b.start`) do not overlap.
    pub fn overlap_minutes(&self, other: &ExamSlot) -> Option<i64> {
        let (a_start, a_end) = (self.starts_at(), self.ends_at());
        let (b_start, b_end) = (other.starts_at(), other.ends_at());
        if a_start < b_end && a_end > b_start {
            Some((a_end.min(b_end) - a_start.max(b_start)).num_minutes())
        } else {
            None
        }
    }

    pub fn overlaps(&self, other: &ExamSlot) -> bool {
        self.overlap_minutes(other).is_some()
    }

    /// Short `date HH:MM-HH:MM` label used in conflict messages.
    pub fn window_label(&self) -> String {
        format!(
            "{} {}-{}",
            self.exam_date,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }

    /// Build a slot from creation data, as a store does on insert.
    pub fn from_new(id: impl Into<String>, data: NewExamSlot) -> Self {
        Self {
            id: id.into(),
            assessment_id: data.assessment_id,
            exam_date: data.exam_date,
            start_time: data.start_time,
            end_time: data.end_time,
            room: data.room,
            batch_section: data.batch_section,
            invigilators: BTreeSet::new(),
            course_code: data.course_code,
            course_name: data.course_name,
            building: data.building,
            version: 1,
        }
    }
}

/// Input for creating a slot. The id, invigilators, and version are assigned later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExamSlot {
    pub assessment_id: String,
    pub exam_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub batch_section: Option<String>,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub building: Option<String>,
}

impl NewExamSlot {
    pub fn new(
        assessment_id: impl Into<String>,
        exam_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            assessment_id: assessment_id.into(),
            exam_date,
            start_time,
            end_time,
            room: None,
            batch_section: None,
            course_code: None,
            course_name: None,
            building: None,
        }
    }

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    pub fn with_batch(mut self, batch: impl Into<String>) -> Self {
        self.batch_section = Some(batch.into());
        self
    }

    pub fn with_course(mut self, code: impl Into<String>, name: impl Into<String>) -> Self {
        self.course_code = Some(code.into());
        self.course_name = Some(name.into());
        self
    }

    /// Trim free-text fields and collapse blank ones to `None`.
    pub fn normalized(mut self) -> Self {
        self.assessment_id = self.assessment_id.trim().to_string();
        self.room = normalize(self.room);
        self.batch_section = normalize(self.batch_section);
        self.course_code = normalize(self.course_code);
        self.course_name = normalize(self.course_name);
        self.building = normalize(self.building);
        self
    }

    /// Check required fields and the time interval.
    pub fn validate(&self) -> Result<()> {
        if self.assessment_id.trim().is_empty() {
            return Err(TimetableError::validation("assessment_id must not be empty"));
        }
        validate_interval(self.start_time, self.end_time)
    }
}

/// A partial update to a slot. Unset fields are left untouched.
///
/// Optional text fields take `Some(None)` to clear the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotPatch {
    pub exam_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub room: Option<Option<String>>,
    pub batch_section: Option<Option<String>>,
    pub course_code: Option<Option<String>>,
    pub course_name: Option<Option<String>>,
    pub building: Option<Option<String>>,
    pub invigilators: Option<BTreeSet<String>>,
}

impl SlotPatch {
    pub fn reschedule(mut self, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        self.exam_date = Some(date);
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn room(mut self, room: Option<&str>) -> Self {
        self.room = Some(room.map(str::to_string));
        self
    }

    pub fn batch(mut self, batch: Option<&str>) -> Self {
        self.batch_section = Some(batch.map(str::to_string));
        self
    }

    pub fn invigilators(mut self, invigilators: BTreeSet<String>) -> Self {
        self.invigilators = Some(invigilators);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch in place. Text values are normalized like [`NewExamSlot::normalized`].
    pub fn apply_to(&self, slot: &mut ExamSlot) {
        if let Some(date) = self.exam_date {
            slot.exam_date = date;
        }
        if let Some(start) = self.start_time {
            slot.start_time = start;
        }
        if let Some(end) = self.end_time {
            slot.end_time = end;
        }
        if let Some(room) = &self.room {
            slot.room = normalize(room.clone());
        }
        if let Some(batch) = &self.batch_section {
            slot.batch_section = normalize(batch.clone());
        }
        if let Some(code) = &self.course_code {
            slot.course_code = normalize(code.clone());
        }
        if let Some(name) = &self.course_name {
            slot.course_name = normalize(name.clone());
        }
        if let Some(building) = &self.building {
            slot.building = normalize(building.clone());
        }
        if let Some(invigilators) = &self.invigilators {
            slot.invigilators = invigilators.clone();
        }
    }
}

/// An interval is well-formed only when it ends strictly after it starts.
pub fn validate_interval(start: NaiveTime, end: NaiveTime) -> Result<()> {
    if end <= start {
        return Err(TimetableError::validation(format!(
            "end_time {} must be after start_time {}",
            end.format("%H:%M"),
            start.format("%H:%M")
        )));
    }
    Ok(())
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time(raw: &str) -> std::result::Result<NaiveTime, String> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|e| format!("invalid time '{raw}': {e}"))
}

fn initial_version() -> u64 {
    1
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The value as stored, or `None` when it is empty or whitespace only.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Serde adapter for time-of-day values: writes `HH:MM` (or `HH:MM:SS` when seconds
/// are set) and reads either form.
pub(crate) mod hhmm {
    use chrono::{NaiveTime, Timelike};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        let text = if time.second() == 0 {
            time.format("%H:%M").to_string()
        } else {
            time.format("%H:%M:%S").to_string()
        };
        s.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time(&raw).map_err(de::Error::custom)
    }
}
