//! Greedy first-fit auto-scheduler over a rolling horizon.
//!
//! Backlog order is placement priority and is never changed. For each day the
//! merged busy set is walked left to right; the head task goes into the first
//! gap large enough for it (plus a buffer once something has been placed that
//! day). There is no backtracking: a head task that fits nowhere keeps every
//! task behind it waiting.

use std::collections::VecDeque;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::busy::BusyIntervalBuilder;
use crate::config::PlannerConfig;
use crate::error::{ScheduleError, ScheduleResult};
use crate::interval::{Interval, IntervalSet, Probe, Severity, SourceKind, SourceRef};
use crate::preferences::UserPreferences;
use crate::task::{BacklogTask, Placement, ScheduleSnapshot};
use crate::time::MINUTES_PER_DAY;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    /// Placements in the order they were made.
    pub assignments: Vec<Placement>,
    /// Tasks still queued when the horizon ran out.
    pub unplaced: Vec<BacklogTask>,
    pub days_examined: u32,
}

impl ScheduleOutcome {
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct AutoScheduler {
    max_weeks: u32,
}

impl Default for AutoScheduler {
    fn default() -> Self {
        Self::from_config(&PlannerConfig::default())
    }
}

impl AutoScheduler {
    pub fn new(max_weeks: u32) -> Self {
        Self { max_weeks }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.max_weeks)
    }

    pub fn horizon_days(&self) -> u32 {
        self.max_weeks.saturating_mul(7)
    }

    /// Place as much of `backlog` as fits, starting on `first_day`.
    ///
    /// Missing or unusable preferences fail before any placement is attempted.
    pub fn run(
        &self,
        backlog: Vec<BacklogTask>,
        prefs: Option<&UserPreferences>,
        snapshot: &ScheduleSnapshot,
        first_day: NaiveDate,
    ) -> ScheduleResult<ScheduleOutcome> {
        let prefs = prefs.ok_or(ScheduleError::MissingPreferences)?;
        prefs.validate()?;

        let mut queue: VecDeque<BacklogTask> = backlog.into();
        let mut outcome = ScheduleOutcome::default();
        if queue.is_empty() {
            info!("auto-schedule: backlog empty, nothing to do");
            return Ok(outcome);
        }

        let builder = BusyIntervalBuilder::new(prefs, snapshot);
        let queued = queue.len();

        for offset in 0..self.horizon_days() {
            if queue.is_empty() {
                break;
            }
            let Some(date) = first_day.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };
            outcome.days_examined += 1;

            let busy = builder.build_set(date, None);
            let (_, placed) = pack_day(date, busy, &mut queue, prefs);
            debug!(%date, placed = placed.len(), remaining = queue.len(), "day packed");
            outcome.assignments.extend(placed);
        }

        outcome.unplaced = queue.into();
        info!(
            queued,
            placed = outcome.assignments.len(),
            unplaced = outcome.unplaced.len(),
            days = outcome.days_examined,
            "auto-schedule finished"
        );
        Ok(outcome)
    }
}

/// Pack the head of `queue` into one day's free time. Returns the grown busy
/// set together with the placements made.
pub fn pack_day(
    date: NaiveDate,
    mut busy: IntervalSet,
    queue: &mut VecDeque<BacklogTask>,
    prefs: &UserPreferences,
) -> (IntervalSet, Vec<Placement>) {
    let mut placed: Vec<Placement> = Vec::new();
    let mut cursor = 0;

    while let Some(task) = queue.front() {
        let duration = task.duration_or(prefs.session_length);
        let buffer = if placed.is_empty() {
            0
        } else {
            prefs.buffer_length
        };

        let (start, end) = match busy.probe(cursor) {
            Probe::Busy { until } => {
                cursor = until;
                continue;
            }
            Probe::Free { start, end } => (start, end),
        };

        if end - start < duration.saturating_add(buffer) {
            if end >= MINUTES_PER_DAY {
                break;
            }
            cursor = end;
            continue;
        }

        let slot_start = start + buffer;
        let slot_end = slot_start + duration;
        let severity = if task.is_stressful {
            Severity::High
        } else {
            Severity::Medium
        };
        let Some(interval) = Interval::new(
            slot_start,
            slot_end,
            SourceRef::new(SourceKind::Task, task.task_id.clone(), task.title.clone()),
            severity,
            true,
        ) else {
            break;
        };

        debug!(task_id = %task.task_id, %date, slot_start, slot_end, "placed");
        placed.push(Placement {
            task_id: task.task_id.clone(),
            date,
            start_minute: slot_start,
            end_minute: slot_end,
        });
        busy = busy.with(interval);
        cursor = slot_end;
        queue.pop_front();
    }

    (busy, placed)
}
