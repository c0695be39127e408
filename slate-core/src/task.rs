//! Task, time-block and schedule snapshot types.
//!
//! These mirror what the persistence layer stores. Timestamps stay as the raw
//! ISO-8601 strings the store hands over; parsing goes through [`crate::time`]
//! so one malformed record cannot abort a whole pass.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::time::parse_timestamp;

/// A task already placed (or placeable) on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarTask {
    pub task_id: String,
    pub title: String,

    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,

    #[serde(default)]
    pub start_time: Option<String>,

    #[serde(default)]
    pub end_time: Option<String>,

    /// Estimated minutes of work.
    #[serde(default)]
    pub effort_units: Option<u32>,

    #[serde(default)]
    pub is_stressful: bool,
}

impl CalendarTask {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            task_id: id.into(),
            title: title.into(),
            scheduled_date: None,
            start_time: None,
            end_time: None,
            effort_units: None,
            is_stressful: false,
        }
    }

    /// Place the task on `date` between two minutes of day.
    pub fn at(mut self, date: NaiveDate, start_minute: u32, end_minute: u32) -> Self {
        self.scheduled_date = Some(date);
        self.start_time = Some(format_timestamp(&stamp(date, start_minute)));
        self.end_time = Some(format_timestamp(&stamp(date, end_minute)));
        self
    }

    pub fn with_effort(mut self, minutes: u32) -> Self {
        self.effort_units = Some(minutes);
        self
    }

    pub fn stressful(mut self) -> Self {
        self.is_stressful = true;
        self
    }
}

/// A fixed appointment the scheduler must route around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub block_id: String,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
}

impl TimeBlock {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        date: NaiveDate,
        start_minute: u32,
        end_minute: u32,
    ) -> Self {
        Self {
            block_id: id.into(),
            title: title.into(),
            start_time: format_timestamp(&stamp(date, start_minute)),
            end_time: format_timestamp(&stamp(date, end_minute)),
        }
    }

    /// Calendar date of the block's start, if its start parses.
    pub fn date(&self) -> Option<NaiveDate> {
        parse_timestamp(&self.start_time).ok().map(|ts| ts.date())
    }
}

/// A not-yet-scheduled unit of work. Queue position is its priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogTask {
    pub task_id: String,
    pub title: String,

    #[serde(default)]
    pub effort_units: Option<u32>,

    #[serde(default)]
    pub is_stressful: bool,
}

impl BacklogTask {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            task_id: id.into(),
            title: title.into(),
            effort_units: None,
            is_stressful: false,
        }
    }

    pub fn with_effort(mut self, minutes: u32) -> Self {
        self.effort_units = Some(minutes);
        self
    }

    /// Effort in minutes, or `fallback` when unset or zero.
    pub fn duration_or(&self, fallback: u32) -> u32 {
        match self.effort_units {
            Some(m) if m > 0 => m,
            _ => fallback,
        }
    }
}

/// Caller-supplied view of the existing calendar, already filtered to the
/// dates of interest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    /// Scheduled tasks keyed by calendar date.
    #[serde(default)]
    pub tasks: BTreeMap<NaiveDate, Vec<CalendarTask>>,

    #[serde(default)]
    pub time_blocks: Vec<TimeBlock>,
}

impl ScheduleSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks_on(&self, date: NaiveDate) -> &[CalendarTask] {
        self.tasks.get(&date).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn blocks_on(&self, date: NaiveDate) -> impl Iterator<Item = &TimeBlock> {
        self.time_blocks
            .iter()
            .filter(move |b| b.date() == Some(date))
    }

    /// Add a task under its `scheduled_date` (tasks without one are ignored).
    pub fn insert_task(&mut self, task: CalendarTask) {
        if let Some(date) = task.scheduled_date {
            self.tasks.entry(date).or_default().push(task);
        }
    }

    pub fn find_task(&self, task_id: &str) -> Option<&CalendarTask> {
        self.tasks
            .values()
            .flat_map(|day| day.iter())
            .find(|t| t.task_id == task_id)
    }
}

/// A concrete placement produced by the auto-scheduler or a drag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub task_id: String,
    pub date: NaiveDate,
    pub start_minute: u32,
    pub end_minute: u32,
}

impl Placement {
    pub fn start(&self) -> NaiveDateTime {
        stamp(self.date, self.start_minute)
    }

    /// End timestamp; an end of 1440 is midnight of the next day.
    pub fn end(&self) -> NaiveDateTime {
        stamp(self.date, self.end_minute)
    }

    pub fn duration(&self) -> u32 {
        self.end_minute.saturating_sub(self.start_minute)
    }
}

// Unclamped: an exclusive end of 1440 lands on the next midnight.
fn stamp(date: NaiveDate, minute: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::minutes(i64::from(minute))
}

/// Timestamp in the store's zone-less ISO form.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}
