//! Daily availability preferences for one user.

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::time::ClockTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Bedtime. May be later in the day than `sleep_end` (sleep wraps midnight).
    pub sleep_start: ClockTime,
    pub sleep_end: ClockTime,

    #[serde(default)]
    pub meal_start_times: Vec<ClockTime>,

    /// Minutes per meal.
    pub meal_duration: u32,

    /// Default task length in minutes when a task carries no estimate.
    pub session_length: u32,

    /// Break in minutes between consecutive auto-placed tasks.
    pub buffer_length: u32,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            sleep_start: ClockTime::hm(23, 0),
            sleep_end: ClockTime::hm(7, 0),
            meal_start_times: vec![ClockTime::hm(8, 0), ClockTime::hm(13, 0), ClockTime::hm(19, 0)],
            meal_duration: 60,
            session_length: 50,
            buffer_length: 10,
        }
    }
}

impl UserPreferences {
    /// Preferences with no meals, only a sleep window.
    pub fn sleep_only(start: ClockTime, end: ClockTime) -> Self {
        Self {
            sleep_start: start,
            sleep_end: end,
            meal_start_times: Vec::new(),
            ..Self::default()
        }
    }

    pub fn sleep_wraps_midnight(&self) -> bool {
        self.sleep_start > self.sleep_end
    }

    /// Invariants the auto-scheduler needs before it can run.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.session_length == 0 {
            return Err(ScheduleError::InvalidPreferences(
                "session_length must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
