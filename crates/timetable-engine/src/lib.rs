//! # timetable-engine
//!
//! Exam timetable scheduling with room, batch, and invigilator conflict detection.
//!
//! Slots are local date + time windows. Two slots conflict when they sit on the
//! same date, their half-open intervals overlap, and they share a room, a
//! student batch, or an invigilator. Publication of an assessment's timetable is
//! gated on the conflict list being empty.
//!
//! ## Quick start
//!
//! ```rust
//! use chrono::{NaiveDate, NaiveTime};
//! use timetable_engine::{detect_conflicts, ConflictType, ExamSlot, NewExamSlot};
//!
//! let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
//! let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
//!
//! let a = ExamSlot::from_new("a", NewExamSlot::new("mid-1", date, at(9), at(11)).with_room("R1"));
//! let b = ExamSlot::from_new("b", NewExamSlot::new("mid-1", date, at(10), at(12)).with_room("R1"));
//! let c = ExamSlot::from_new("c", NewExamSlot::new("mid-1", date, at(11), at(13)).with_room("R2"));
//!
//! let conflicts = detect_conflicts(&[a, b, c]);
//! assert_eq!(conflicts.len(), 1);
//! assert_eq!(conflicts[0].kind, ConflictType::Room);
//! ```
//!
//! ## Modules
//!
//! - [`slot`]: `ExamSlot` records, creation input, patches, interval validation
//! - [`assessment`]: parent assessment and its status lifecycle
//! - [`conflict`]: pairwise room/batch/faculty conflict detection
//! - [`freebusy`]: free windows for a room, batch, or invigilator
//! - [`store`]: persistence traits and slot filters
//! - [`memory`]: in-memory store implementation
//! - [`scheduler`]: slot creation, invigilator assignment, publication gate
//! - [`summary`]: timetable readiness overview
//! - [`config`]: scheduler configuration
//! - [`error`]: error types

pub mod assessment;
pub mod config;
pub mod conflict;
pub mod error;
pub mod freebusy;
pub mod memory;
pub mod scheduler;
pub mod slot;
pub mod store;
pub mod summary;

pub use assessment::{Assessment, AssessmentStatus};
pub use config::SchedulerConfig;
pub use conflict::{detect_conflicts, faculty_conflicts, Conflict, ConflictType};
pub use error::{StoreError, TimetableError};
pub use freebusy::{find_first_free_window, find_free_windows, FreeWindow, Resource};
pub use memory::{InMemoryStore, Snapshot};
pub use scheduler::TimetableScheduler;
pub use slot::{ExamSlot, NewExamSlot, SlotPatch};
pub use store::{AssessmentStore, SlotFilter, SlotStore, VersionGuard};
pub use summary::TimetableSummary;
