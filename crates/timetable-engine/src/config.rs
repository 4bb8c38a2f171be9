//! Scheduler configuration.
//!
//! Loaded from defaults, a TOML file, or `TIMETABLE_*` environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assessment::AssessmentStatus;
use crate::error::{Result, TimetableError};

/// Tunables for [`TimetableScheduler`](crate::TimetableScheduler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Reject slot mutations when the parent assessment is not in
    /// `mutable_statuses`.
    pub enforce_assessment_lock: bool,

    /// Assessment statuses under which slots may be created, edited, or staffed.
    pub mutable_statuses: Vec<AssessmentStatus>,

    /// Number of conflict messages quoted in an error's text.
    pub conflict_preview_limit: usize,

    /// Rounds of check-and-write for an invigilator assignment before a
    /// concurrent-modification failure is surfaced.
    pub max_assign_attempts: u32,

    /// Allow publishing an assessment that has no slots.
    pub allow_empty_publish: bool,

    /// Reject slots dated before today.
    pub reject_past_dates: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enforce_assessment_lock: true,
            mutable_statuses: vec![AssessmentStatus::Draft, AssessmentStatus::Scheduled],
            conflict_preview_limit: 5,
            max_assign_attempts: 3,
            allow_empty_publish: false,
            reject_past_dates: false,
        }
    }
}

impl SchedulerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| TimetableError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TimetableError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by `TIMETABLE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = env_parse::<bool>("TIMETABLE_ENFORCE_ASSESSMENT_LOCK")? {
            config.enforce_assessment_lock = v;
        }
        if let Ok(raw) = std::env::var("TIMETABLE_MUTABLE_STATUSES") {
            config.mutable_statuses = raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.parse::<AssessmentStatus>())
                .collect::<std::result::Result<_, _>>()
                .map_err(TimetableError::Config)?;
        }
        if let Some(v) = env_parse::<usize>("TIMETABLE_CONFLICT_PREVIEW_LIMIT")? {
            config.conflict_preview_limit = v;
        }
        if let Some(v) = env_parse::<u32>("TIMETABLE_MAX_ASSIGN_ATTEMPTS")? {
            config.max_assign_attempts = v;
        }
        if let Some(v) = env_parse::<bool>("TIMETABLE_ALLOW_EMPTY_PUBLISH")? {
            config.allow_empty_publish = v;
        }
        if let Some(v) = env_parse::<bool>("TIMETABLE_REJECT_PAST_DATES")? {
            config.reject_past_dates = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.mutable_statuses.is_empty() {
            return Err(TimetableError::Config(
                "mutable_statuses must list at least one status".into(),
            ));
        }
        if self.conflict_preview_limit == 0 {
            return Err(TimetableError::Config(
                "conflict_preview_limit must be greater than 0".into(),
            ));
        }
        if self.max_assign_attempts == 0 {
            return Err(TimetableError::Config(
                "max_assign_attempts must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn is_mutable(&self, status: AssessmentStatus) -> bool {
        self.mutable_statuses.contains(&status)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| TimetableError::Config(format!("{key} has an invalid value: '{raw}'"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SchedulerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_mutable(AssessmentStatus::Draft));
        assert!(!config.is_mutable(AssessmentStatus::Ongoing));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SchedulerConfig::from_toml_str(
            r#"
            conflict_preview_limit = 2
            mutable_statuses = ["draft"]
            "#,
        )
        .unwrap();
        assert_eq!(config.conflict_preview_limit, 2);
        assert_eq!(config.mutable_statuses, vec![AssessmentStatus::Draft]);
        assert_eq!(config.max_assign_attempts, 3);
        assert!(config.enforce_assessment_lock);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(SchedulerConfig::from_toml_str("max_assign_attempts = 0").is_err());
        assert!(SchedulerConfig::from_toml_str("mutable_statuses = []").is_err());
        assert!(SchedulerConfig::from_toml_str("mutable_statuses = [\"locked\"]").is_err());
    }
}
