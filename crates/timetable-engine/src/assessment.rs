//! Parent assessment records and their status lifecycle.
//!
//! An assessment moves strictly forward one step at a time:
//! `draft → scheduled → ongoing → completed`. The `scheduled → ongoing` step is
//! taken only by [`TimetableScheduler::publish_timetable`](crate::TimetableScheduler::publish_timetable).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status of an assessment as far as timetabling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    #[default]
    Draft,
    Scheduled,
    Ongoing,
    Completed,
}

impl AssessmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
        }
    }

    /// The single legal forward step, or `None` from `Completed`.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Draft => Some(Self::Scheduled),
            Self::Scheduled => Some(Self::Ongoing),
            Self::Ongoing => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Whether `self → to` is a legal transition.
    pub fn can_transition_to(&self, to: Self) -> bool {
        self.next() == Some(to)
    }
}

impl fmt::Display for AssessmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssessmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown assessment status: '{other}'")),
        }
    }
}

/// An exam/test definition that owns a set of exam slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub status: AssessmentStatus,
}

impl Assessment {
    pub fn new(id: impl Into<String>, status: AssessmentStatus) -> Self {
        Self {
            id: id.into(),
            name: None,
            status,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
