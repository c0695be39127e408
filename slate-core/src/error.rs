//! Error taxonomy for the planning core.
//!
//! Input defects in timestamps surface as [`TimeError`] from the strict `try_*`
//! helpers; the soft helpers in [`crate::time`] log and fall back instead.
//! Constraint violations and task defects are rejections the caller can recover
//! from. [`ScheduleError`] covers everything that stops an operation outright.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("timestamp is empty")]
    Empty,

    #[error("unparseable timestamp '{0}'")]
    Unparseable(String),

    #[error("invalid clock time '{0}' (expected HH:MM)")]
    InvalidClock(String),

    #[error("start time must be before end time")]
    StartNotBeforeEnd,

    #[error("time extends beyond 24-hour period")]
    BeyondDay,
}

/// Basic constraints a candidate placement must satisfy before any conflict
/// search runs. The display strings are user-facing.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintViolation {
    #[error("Start time must be before end time")]
    StartNotBeforeEnd,

    #[error("Task duration must be at least {min} minutes")]
    TooShort { min: u32 },

    #[error("Task duration cannot exceed {max} minutes")]
    TooLong { max: u32 },

    #[error("Time extends beyond valid 24-hour period")]
    OutsideDay,

    #[error("Tasks cannot span multiple days")]
    SpansMultipleDays,

    #[error("Task cannot be moved off its target day")]
    LeavesTargetDay,
}

/// Reasons a task cannot be picked up for a drag at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskDefect {
    #[error("Task is missing required ID")]
    MissingId,

    #[error("Task is missing a valid title")]
    MissingTitle,

    #[error("Task has no start time - cannot be moved")]
    MissingStart,

    #[error("Task has no end time - cannot be moved")]
    MissingEnd,

    #[error("Task has invalid start time format")]
    InvalidStart,

    #[error("Task has invalid end time format")]
    InvalidEnd,

    #[error("Task start time must be before end time")]
    StartNotBeforeEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("User preferences not loaded - cannot schedule")]
    MissingPreferences,

    #[error("invalid preferences: {0}")]
    InvalidPreferences(String),

    #[error(transparent)]
    Task(#[from] TaskDefect),

    #[error("Cannot move task more than {limit} minutes from its original position")]
    GestureTooLarge { limit: u32 },

    #[error("{0}")]
    InvalidDropTarget(String),

    #[error("Task has invalid duration - cannot reschedule")]
    InvalidDuration,
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_user_facing() {
        assert_eq!(
            ConstraintViolation::TooShort { min: 15 }.to_string(),
            "Task duration must be at least 15 minutes"
        );
        assert_eq!(
            ScheduleError::from(TaskDefect::MissingTitle).to_string(),
            "Task is missing a valid title"
        );
        assert_eq!(
            ScheduleError::GestureTooLarge { limit: 1440 }.to_string(),
            "Cannot move task more than 1440 minutes from its original position"
        );
    }
}
