//! Error types for timetable-engine operations.

use thiserror::Error;

use crate::assessment::AssessmentStatus;
use crate::conflict::Conflict;

/// Failures reported by a [`SlotStore`](crate::store::SlotStore) or
/// [`AssessmentStore`](crate::store::AssessmentStore) implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No row with the given primary key.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A guarded write found a row at a different version than the caller read.
    /// `found` is 0 when the guarded slot no longer exists.
    #[error("slot {slot_id} changed concurrently (expected version {expected}, found {found})")]
    VersionMismatch {
        slot_id: String,
        expected: u64,
        found: u64,
    },

    /// A compare-and-set status transition found an unexpected current status.
    #[error("assessment {assessment_id} is {found}, expected {expected}")]
    StatusMismatch {
        assessment_id: String,
        expected: AssessmentStatus,
        found: AssessmentStatus,
    },

    /// Constraint violation, connectivity, or serialization failure in the backend.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the scheduler and the public API.
#[derive(Error, Debug)]
pub enum TimetableError {
    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced slot or assessment does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// One or more scheduling conflicts block the requested mutation.
    /// `conflicts` always holds the complete list.
    #[error("Scheduling conflict: {message}")]
    Conflict {
        message: String,
        conflicts: Vec<Conflict>,
    },

    /// The parent assessment's status forbids the operation.
    #[error("Cannot {action}: assessment {assessment_id} is {status}")]
    InvalidState {
        assessment_id: String,
        status: AssessmentStatus,
        action: &'static str,
    },

    /// The underlying store failed independently of business logic.
    #[error("Persistence error: {0}")]
    Persistence(StoreError),

    /// Configuration could not be loaded or failed validation.
    #[error("Config error: {0}")]
    Config(String),
}

impl TimetableError {
    /// Whether retrying the same call could succeed without any input change.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Persistence(StoreError::Backend(_))
                | Self::Persistence(StoreError::VersionMismatch { .. })
        )
    }

    /// The conflict list carried by a [`TimetableError::Conflict`], empty otherwise.
    pub fn conflicts(&self) -> &[Conflict] {
        match self {
            Self::Conflict { conflicts, .. } => conflicts,
            _ => &[],
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<StoreError> for TimetableError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::StatusMismatch {
                assessment_id,
                found,
                ..
            } => Self::InvalidState {
                assessment_id,
                status: found,
                action: "change status",
            },
            other => Self::Persistence(other),
        }
    }
}

/// Convenience alias used throughout timetable-engine.
pub type Result<T> = std::result::Result<T, TimetableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_not_found() {
        let err: TimetableError = StoreError::NotFound {
            entity: "slot",
            id: "s-1".to_string(),
        }
        .into();
        assert!(matches!(err, TimetableError::NotFound { entity: "slot", .. }));
        assert_eq!(err.to_string(), "slot not found: s-1");
    }

    #[test]
    fn backend_failure_is_recoverable_validation_is_not() {
        let err: TimetableError = StoreError::Backend("connection reset".into()).into();
        assert!(err.is_recoverable());
        assert!(!TimetableError::validation("bad").is_recoverable());
    }

    #[test]
    fn status_mismatch_maps_to_invalid_state() {
        let err: TimetableError = StoreError::StatusMismatch {
            assessment_id: "a-1".into(),
            expected: AssessmentStatus::Scheduled,
            found: AssessmentStatus::Ongoing,
        }
        .into();
        match err {
            TimetableError::InvalidState { status, .. } => {
                assert_eq!(status, AssessmentStatus::Ongoing)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
