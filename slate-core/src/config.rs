//! Tunables for validation, auto-scheduling and drag handling.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Auto-scheduler horizon in weeks.
    pub max_weeks: u32,

    /// Snap step for dragged placements.
    pub grid_step_minutes: u32,

    /// Largest drag offset accepted as a real gesture.
    pub max_gesture_minutes: u32,

    /// Pixels per hour on the calendar grid.
    pub hour_height_px: f64,

    /// How far back a drop target may lie.
    pub past_window_days: u64,

    /// How far ahead a drop target may lie.
    pub future_window_days: u64,

    /// Accept drags whose only conflicts are overridable, medium severity.
    pub allow_overrides: bool,

    pub validator: ValidatorOptions,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_weeks: 5,
            grid_step_minutes: 15,
            max_gesture_minutes: 1440,
            hour_height_px: 64.0,
            past_window_days: 7,
            future_window_days: 365,
            allow_overrides: false,
            validator: ValidatorOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    pub allow_sleep_overlap: bool,
    pub allow_meal_overlap: bool,
    pub allow_task_overlap: bool,
    pub allow_time_block_overlap: bool,

    pub min_task_duration: u32,
    pub max_task_duration: u32,

    /// Padding in minutes on both sides of existing tasks.
    pub buffer_time: u32,

    pub short_task_warning: u32,
    pub long_task_warning: u32,
    pub early_hour: u32,
    pub late_hour: u32,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            allow_sleep_overlap: false,
            allow_meal_overlap: false,
            allow_task_overlap: false,
            allow_time_block_overlap: false,
            min_task_duration: 15,
            max_task_duration: 480,
            buffer_time: 0,
            short_task_warning: 30,
            long_task_warning: 240,
            early_hour: 6,
            late_hour: 22,
        }
    }
}
