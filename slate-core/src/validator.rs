//! Conflict validation for a candidate time slot.
//!
//! Each source (sleep, meals, tasks, time blocks) is checked on its own,
//! against unmerged intervals, so every conflict keeps its origin. Severity and
//! overridability come from the busy intervals themselves:
//!
//! | source     | severity                   | overridable |
//! |------------|----------------------------|-------------|
//! | sleep      | high                       | no          |
//! | time block | high                       | no          |
//! | meal       | medium                     | yes         |
//! | task       | high if stressful, medium  | yes         |

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::busy::{BusyIntervalBuilder, meal_intervals, sleep_intervals, task_intervals, time_block_intervals};
use crate::config::ValidatorOptions;
use crate::error::ConstraintViolation;
use crate::interval::{Interval, Severity, SourceKind};
use crate::preferences::UserPreferences;
use crate::task::ScheduleSnapshot;
use crate::time::{MINUTES_PER_DAY, QUARTER_HOUR, clock_string, minute_of};

/// One overlap between the candidate and a busy item. The time range is the
/// clipped overlap, not the item's full span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: SourceKind,
    pub id: String,
    pub title: String,
    pub start_minute: u32,
    pub end_minute: u32,
    pub severity: Severity,
    pub overridable: bool,
}

impl Conflict {
    fn clipped(interval: &Interval, start: u32, end: u32) -> Option<Self> {
        let source = interval.tag.sources().first()?;
        let mut cs = start.max(interval.start);
        let mut ce = end.min(interval.end);
        if cs >= ce {
            // Only the buffer overlapped; report the item's own span.
            cs = interval.start;
            ce = interval.end;
        }
        Some(Self {
            kind: source.kind,
            id: source.id.clone(),
            title: source.title.clone(),
            start_minute: cs,
            end_minute: ce,
            severity: interval.severity,
            overridable: interval.overridable,
        })
    }

    pub fn start_time(&self) -> String {
        clock_string(i64::from(self.start_minute))
    }

    pub fn end_time(&self) -> String {
        clock_string(i64::from(self.end_minute.min(MINUTES_PER_DAY - 1)))
    }

    pub fn time_range(&self) -> String {
        if self.end_minute >= MINUTES_PER_DAY {
            format!("{} - 24:00", self.start_time())
        } else {
            format!("{} - {}", self.start_time(), self.end_time())
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.time_range())
    }
}

/// Informational notes that never block a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    ShortDuration,
    LongDuration,
    EarlyStart,
    LateEnd,
    Weekend,
    InPast,
    VeryShortTask,
    VeryLongTask,
    NoEstimate,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Warning::ShortDuration => "Very short task duration",
            Warning::LongDuration => "Very long task duration",
            Warning::EarlyStart => "Task scheduled very early in the morning",
            Warning::LateEnd => "Task scheduled late in the evening",
            Warning::Weekend => "Task scheduled on weekend",
            Warning::InPast => "Task scheduled in the past",
            Warning::VeryShortTask => "Task duration is very short (less than 15 minutes)",
            Warning::VeryLongTask => "Task duration is very long (more than 8 hours)",
            Warning::NoEstimate => "Task has no effort estimate - using default duration",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
    pub warnings: Vec<Warning>,
    pub is_valid: bool,
    pub can_proceed: bool,
    pub message: String,
    /// Set when a basic constraint failed before any conflict search ran.
    pub violation: Option<ConstraintViolation>,
}

impl ConflictReport {
    pub fn rejected(violation: ConstraintViolation) -> Self {
        Self {
            conflicts: Vec::new(),
            warnings: Vec::new(),
            is_valid: false,
            can_proceed: false,
            message: violation.to_string(),
            violation: Some(violation),
        }
    }

    fn evaluated(conflicts: Vec<Conflict>, warnings: Vec<Warning>) -> Self {
        let can_proceed = conflicts
            .iter()
            .all(|c| c.overridable && c.severity != Severity::High);
        let message = user_message(&conflicts, &warnings);
        Self {
            is_valid: conflicts.is_empty(),
            can_proceed,
            conflicts,
            warnings,
            message,
            violation: None,
        }
    }

    pub fn conflict_kinds(&self) -> BTreeSet<SourceKind> {
        self.conflicts.iter().map(|c| c.kind).collect()
    }

    pub fn has_conflict_with(&self, kind: SourceKind) -> bool {
        self.conflicts.iter().any(|c| c.kind == kind)
    }
}

fn user_message(conflicts: &[Conflict], warnings: &[Warning]) -> String {
    let kinds: BTreeSet<SourceKind> = conflicts.iter().map(|c| c.kind).collect();

    match (conflicts, kinds.len()) {
        ([], _) => match warnings.first() {
            Some(w) => format!("Time slot is available. Note: {w}"),
            None => "Time slot is available".to_string(),
        },
        ([only], _) => format!(
            "Time slot conflicts with {} ({}, {})",
            only.kind.describe(),
            only.title,
            only.time_range()
        ),
        (many, 1) => format!(
            "Time slot conflicts with {} {}",
            many.len(),
            plural(many[0].kind)
        ),
        (many, _) => format!("Time slot conflicts with {} scheduled items", many.len()),
    }
}

fn plural(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Sleep => "sleep periods",
        SourceKind::Meal => "meal times",
        SourceKind::TimeBlock => "scheduled appointments",
        SourceKind::Task => "other tasks",
    }
}

/// A free slot found by [`ConflictValidator::available_slots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Distance in minutes from the preferred start (0 when not ranked).
    pub score: u32,
}

/// Validates candidate placements against one snapshot of the user's day.
#[derive(Debug, Clone)]
pub struct ConflictValidator<'a> {
    busy: BusyIntervalBuilder<'a>,
    options: ValidatorOptions,
}

impl<'a> ConflictValidator<'a> {
    pub fn new(
        prefs: &'a UserPreferences,
        snapshot: &'a ScheduleSnapshot,
        options: ValidatorOptions,
    ) -> Self {
        Self {
            busy: BusyIntervalBuilder::new(prefs, snapshot),
            options,
        }
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Validate `[start, end)`. `now` drives the past-date warning only.
    pub fn validate(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude_task_id: Option<&str>,
        now: NaiveDateTime,
    ) -> ConflictReport {
        if let Err(violation) = self.check_basic(&start, &end) {
            debug!(%start, %end, %violation, "candidate rejected");
            return ConflictReport::rejected(violation);
        }

        let date = start.date();
        let s = minute_of(&start);
        let e = s + minutes_between(&start, &end);

        let mut conflicts = Vec::new();
        let prefs = self.busy.preferences();
        let snapshot = self.busy.snapshot();

        if !self.options.allow_sleep_overlap {
            conflicts.extend(overlapping(&sleep_intervals(prefs), s, e, 0));
        }
        if !self.options.allow_meal_overlap {
            conflicts.extend(overlapping(&meal_intervals(prefs), s, e, 0));
        }
        if !self.options.allow_task_overlap {
            let tasks = task_intervals(date, snapshot.tasks_on(date), exclude_task_id);
            conflicts.extend(overlapping(&tasks, s, e, self.options.buffer_time));
        }
        if !self.options.allow_time_block_overlap {
            let blocks = time_block_intervals(date, &snapshot.time_blocks);
            conflicts.extend(overlapping(&blocks, s, e, 0));
        }

        let warnings = self.warnings(&start, s, e, now);
        let report = ConflictReport::evaluated(conflicts, warnings);
        debug!(
            %start,
            %end,
            conflicts = report.conflicts.len(),
            can_proceed = report.can_proceed,
            "candidate validated"
        );
        report
    }

    /// Validate a minute span on `date`. Spans reaching past the day are
    /// rejected before any timestamp is built.
    pub fn validate_on(
        &self,
        date: NaiveDate,
        start_minute: u32,
        end_minute: u32,
        exclude_task_id: Option<&str>,
        now: NaiveDateTime,
    ) -> ConflictReport {
        if start_minute >= end_minute {
            return ConflictReport::rejected(ConstraintViolation::StartNotBeforeEnd);
        }
        if start_minute >= MINUTES_PER_DAY || end_minute > MINUTES_PER_DAY {
            return ConflictReport::rejected(ConstraintViolation::OutsideDay);
        }
        let midnight = date.and_time(NaiveTime::MIN);
        self.validate(
            midnight + Duration::minutes(i64::from(start_minute)),
            midnight + Duration::minutes(i64::from(end_minute)),
            exclude_task_id,
            now,
        )
    }

    fn check_basic(
        &self,
        start: &NaiveDateTime,
        end: &NaiveDateTime,
    ) -> Result<(), ConstraintViolation> {
        if start >= end {
            return Err(ConstraintViolation::StartNotBeforeEnd);
        }

        let minutes = (*end - *start).num_minutes();
        if minutes < i64::from(self.options.min_task_duration) {
            return Err(ConstraintViolation::TooShort {
                min: self.options.min_task_duration,
            });
        }
        if minutes > i64::from(self.options.max_task_duration) {
            return Err(ConstraintViolation::TooLong {
                max: self.options.max_task_duration,
            });
        }

        // Ending exactly at the following midnight still counts as one day.
        let day_end = start.date().succ_opt().map(|next| next.and_time(NaiveTime::MIN));
        if day_end.is_some_and(|day_end| *end > day_end) {
            return Err(ConstraintViolation::SpansMultipleDays);
        }

        Ok(())
    }

    fn warnings(&self, start: &NaiveDateTime, s: u32, e: u32, now: NaiveDateTime) -> Vec<Warning> {
        let mut out = Vec::new();
        let minutes = e - s;

        if minutes < self.options.short_task_warning {
            out.push(Warning::ShortDuration);
        } else if minutes > self.options.long_task_warning {
            out.push(Warning::LongDuration);
        }

        // Hours from minutes so a midnight end reads as hour 24.
        if s / 60 < self.options.early_hour {
            out.push(Warning::EarlyStart);
        } else if e / 60 > self.options.late_hour {
            out.push(Warning::LateEnd);
        }

        if matches!(start.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(Warning::Weekend);
        }

        if *start < now {
            out.push(Warning::InPast);
        }

        out
    }

    /// Every quarter-hour start on `date` where a task of `duration` minutes
    /// validates without conflicts and stays on the same day.
    pub fn available_slots(
        &self,
        date: NaiveDate,
        duration: u32,
        exclude_task_id: Option<&str>,
        now: NaiveDateTime,
    ) -> Vec<CandidateSlot> {
        let midnight = date.and_time(NaiveTime::MIN);
        (0..MINUTES_PER_DAY)
            .step_by(QUARTER_HOUR as usize)
            .filter_map(|m| {
                let start = midnight + Duration::minutes(i64::from(m));
                let end = start + Duration::minutes(i64::from(duration));
                if end.date() != date {
                    return None;
                }
                self.validate(start, end, exclude_task_id, now)
                    .is_valid
                    .then_some(CandidateSlot { start, end, score: 0 })
            })
            .collect()
    }

    /// Up to `max` available slots on the preferred start's day, closest first.
    pub fn suggest_alternatives(
        &self,
        preferred_start: NaiveDateTime,
        duration: u32,
        exclude_task_id: Option<&str>,
        max: usize,
        now: NaiveDateTime,
    ) -> Vec<CandidateSlot> {
        let preferred = minute_of(&preferred_start);
        let mut slots: Vec<CandidateSlot> = self
            .available_slots(preferred_start.date(), duration, exclude_task_id, now)
            .into_iter()
            .map(|slot| CandidateSlot {
                score: minute_of(&slot.start).abs_diff(preferred),
                ..slot
            })
            .collect();
        slots.sort_by_key(|slot| slot.score);
        slots.truncate(max);
        slots
    }
}

fn minutes_between(start: &NaiveDateTime, end: &NaiveDateTime) -> u32 {
    u32::try_from((*end - *start).num_minutes()).unwrap_or(0)
}

fn overlapping(intervals: &[Interval], start: u32, end: u32, buffer: u32) -> Vec<Conflict> {
    intervals
        .iter()
        .filter(|iv| {
            start < iv.end.saturating_add(buffer) && end.saturating_add(buffer) > iv.start
        })
        .filter_map(|iv| Conflict::clipped(iv, start, end))
        .collect()
}
