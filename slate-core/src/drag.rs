//! Manual drag-and-drop rescheduling.
//!
//! A drag moves a task by a pointer-derived offset onto a target day. The new
//! start keeps the task's time of day, shifts it by the offset and snaps it to
//! the grid; the validator then decides whether the move stands.

use chrono::{Days, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PlannerConfig;
use crate::error::{ConstraintViolation, ScheduleError, ScheduleResult, TaskDefect};
use crate::preferences::UserPreferences;
use crate::task::{CalendarTask, Placement, ScheduleSnapshot};
use crate::time::{minute_of, parse_timestamp, round_to_grid};
use crate::validator::{ConflictReport, ConflictValidator, Warning};

const SHORT_DRAG_MINUTES: i64 = 15;
const LONG_DRAG_MINUTES: i64 = 480;

/// Vertical pointer travel in pixels to minutes on the calendar grid.
pub fn offset_from_pixels(delta_y: f64, hour_height_px: f64) -> f64 {
    if hour_height_px <= 0.0 {
        return 0.0;
    }
    (delta_y / hour_height_px * 60.0).round()
}

/// Resolve a drop target id (a day column) into a calendar date within the
/// configured window around `today`. A window reaching past the calendar's
/// range is unbounded on that side.
pub fn validate_drop_target(
    target: Option<&str>,
    today: NaiveDate,
    config: &PlannerConfig,
) -> ScheduleResult<NaiveDate> {
    let id = match target.map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => return Err(drop_error("No drop target specified")),
    };
    if id.starts_with("navigate-") {
        return Err(drop_error("Cannot drop on navigation area"));
    }

    let date = parse_timestamp(id)
        .map(|ts| ts.date())
        .map_err(|_| drop_error("Invalid drop target date format"))?;

    let earliest = today.checked_sub_days(Days::new(config.past_window_days));
    if earliest.is_some_and(|earliest| date < earliest) {
        return Err(ScheduleError::InvalidDropTarget(format!(
            "Cannot schedule tasks more than {} days in the past",
            config.past_window_days
        )));
    }
    let latest = today.checked_add_days(Days::new(config.future_window_days));
    if latest.is_some_and(|latest| date > latest) {
        return Err(ScheduleError::InvalidDropTarget(format!(
            "Cannot schedule tasks more than {} days in the future",
            config.future_window_days
        )));
    }
    Ok(date)
}

fn drop_error(msg: &str) -> ScheduleError {
    ScheduleError::InvalidDropTarget(msg.to_string())
}

/// Parsed placement of a task that can be picked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraggableTask {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub warnings: Vec<Warning>,
}

impl DraggableTask {
    pub fn span_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Check that `task` has an id, a title and a well-formed placement.
pub fn validate_task_for_drag(task: &CalendarTask) -> Result<DraggableTask, TaskDefect> {
    if task.task_id.trim().is_empty() {
        return Err(TaskDefect::MissingId);
    }
    if task.title.trim().is_empty() {
        return Err(TaskDefect::MissingTitle);
    }
    let raw_start = task.start_time.as_deref().ok_or(TaskDefect::MissingStart)?;
    let raw_end = task.end_time.as_deref().ok_or(TaskDefect::MissingEnd)?;
    let start = parse_timestamp(raw_start).map_err(|_| TaskDefect::InvalidStart)?;
    let end = parse_timestamp(raw_end).map_err(|_| TaskDefect::InvalidEnd)?;
    if start >= end {
        return Err(TaskDefect::StartNotBeforeEnd);
    }

    let mut warnings = Vec::new();
    let span = (end - start).num_minutes();
    if span < SHORT_DRAG_MINUTES {
        warnings.push(Warning::VeryShortTask);
    }
    if span > LONG_DRAG_MINUTES {
        warnings.push(Warning::VeryLongTask);
    }
    if task.effort_units.unwrap_or(0) == 0 {
        warnings.push(Warning::NoEstimate);
    }

    Ok(DraggableTask {
        start,
        end,
        warnings,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedPlacement {
    pub placement: Placement,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Task-level warnings followed by the validator's slot warnings.
    pub warnings: Vec<Warning>,
    /// The validator's verdict on the new slot. Carries the overridden
    /// conflicts when overrides are enabled.
    pub report: ConflictReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DragOutcome {
    Accepted(AcceptedPlacement),
    Rejected(ConflictReport),
}

impl DragOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DragOutcome::Accepted(_))
    }

    pub fn report(&self) -> &ConflictReport {
        match self {
            DragOutcome::Accepted(accepted) => &accepted.report,
            DragOutcome::Rejected(report) => report,
        }
    }
}

/// Turns drag gestures into validated placements for one snapshot.
#[derive(Debug, Clone)]
pub struct DragRescheduler<'a> {
    validator: ConflictValidator<'a>,
    config: &'a PlannerConfig,
}

impl<'a> DragRescheduler<'a> {
    pub fn new(
        prefs: Option<&'a UserPreferences>,
        snapshot: &'a ScheduleSnapshot,
        config: &'a PlannerConfig,
    ) -> ScheduleResult<Self> {
        let prefs = prefs.ok_or(ScheduleError::MissingPreferences)?;
        Ok(Self {
            validator: ConflictValidator::new(prefs, snapshot, config.validator.clone()),
            config,
        })
    }

    pub fn validator(&self) -> &ConflictValidator<'a> {
        &self.validator
    }

    /// Move `task` by `pointer_delta_minutes` onto `target_date`.
    ///
    /// Errors are malformed tasks or gestures. A slot that fails validation is
    /// an `Ok(DragOutcome::Rejected)` the caller rolls back from.
    pub fn reschedule(
        &self,
        task: &CalendarTask,
        pointer_delta_minutes: f64,
        target_date: NaiveDate,
        now: NaiveDateTime,
    ) -> ScheduleResult<DragOutcome> {
        let current = validate_task_for_drag(task)?;

        let limit = self.config.max_gesture_minutes;
        if !pointer_delta_minutes.is_finite() || pointer_delta_minutes.abs().round() > f64::from(limit) {
            return Err(ScheduleError::GestureTooLarge { limit });
        }
        let offset = pointer_delta_minutes.round() as i64;

        let duration =
            u32::try_from(current.span_minutes()).map_err(|_| ScheduleError::InvalidDuration)?;
        let raw_start = target_date
            .and_time(current.start.time())
            .checked_add_signed(Duration::minutes(offset))
            .ok_or(ScheduleError::GestureTooLarge { limit })?;
        let start = round_to_grid(raw_start, self.config.grid_step_minutes);
        let end = start
            .checked_add_signed(Duration::minutes(i64::from(duration)))
            .ok_or(ScheduleError::InvalidDuration)?;
        debug!(
            task_id = %task.task_id,
            offset,
            %raw_start,
            %start,
            %end,
            "drag candidate"
        );

        if start.date() != target_date {
            return Ok(DragOutcome::Rejected(ConflictReport::rejected(
                ConstraintViolation::LeavesTargetDay,
            )));
        }

        let report = self
            .validator
            .validate(start, end, Some(task.task_id.as_str()), now);
        let accepted = report.is_valid || (report.can_proceed && self.config.allow_overrides);
        if !accepted {
            info!(task_id = %task.task_id, reason = %report.message, "drag rejected");
            return Ok(DragOutcome::Rejected(report));
        }

        let start_minute = minute_of(&start);
        let mut warnings = current.warnings;
        warnings.extend(report.warnings.iter().copied());
        info!(task_id = %task.task_id, %start, %end, "drag accepted");
        Ok(DragOutcome::Accepted(AcceptedPlacement {
            placement: Placement {
                task_id: task.task_id.clone(),
                date: target_date,
                start_minute,
                end_minute: start_minute.saturating_add(duration),
            },
            start,
            end,
            warnings,
            report,
        }))
    }

    /// Pointer travel in pixels onto a drop target id, validated against the
    /// drop window around `now`.
    pub fn reschedule_drop(
        &self,
        task: &CalendarTask,
        delta_y_px: f64,
        drop_target: Option<&str>,
        now: NaiveDateTime,
    ) -> ScheduleResult<DragOutcome> {
        let target = validate_drop_target(drop_target, now.date(), self.config)?;
        let offset = offset_from_pixels(delta_y_px, self.config.hour_height_px);
        self.reschedule(task, offset, target, now)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::SourceKind;
    use crate::task::TimeBlock;
    use crate::time::ClockTime;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn now() -> NaiveDateTime {
        ts("2026-03-01T08:00")
    }

    fn prefs() -> UserPreferences {
        UserPreferences {
            meal_start_times: vec![ClockTime::hm(12, 30)],
            meal_duration: 60,
            ..UserPreferences::sleep_only(ClockTime::hm(23, 0), ClockTime::hm(7, 0))
        }
    }

    fn accepted(outcome: DragOutcome) -> AcceptedPlacement {
        match outcome {
            DragOutcome::Accepted(a) => a,
            DragOutcome::Rejected(r) => panic!("unexpected rejection: {}", r.message),
        }
    }

    #[test]
    fn test_pixels_to_minutes() {
        assert_eq!(offset_from_pixels(64.0, 64.0), 60.0);
        assert_eq!(offset_from_pixels(-16.0, 64.0), -15.0);
        assert_eq!(offset_from_pixels(10.0, 64.0), 9.0);
        assert_eq!(offset_from_pixels(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_drop_targets() {
        let cfg = PlannerConfig::default();
        let today = day(4);

        assert_eq!(validate_drop_target(Some("2026-03-06"), today, &cfg), Ok(day(6)));
        assert!(matches!(
            validate_drop_target(None, today, &cfg),
            Err(ScheduleError::InvalidDropTarget(_))
        ));
        assert_eq!(
            validate_drop_target(Some("navigate-next"), today, &cfg)
                .unwrap_err()
                .to_string(),
            "Cannot drop on navigation area"
        );
        assert!(validate_drop_target(Some("not-a-day"), today, &cfg).is_err());
        assert!(validate_drop_target(Some("2026-02-20"), today, &cfg).is_err());
        assert!(validate_drop_target(Some("2027-06-01"), today, &cfg).is_err());
    }

    #[test]
    fn test_oversized_drop_window_is_unbounded() {
        let cfg = PlannerConfig {
            past_window_days: 100_000_000,
            future_window_days: u64::MAX,
            ..PlannerConfig::default()
        };
        let today = day(4);

        assert_eq!(validate_drop_target(Some("2026-03-04"), today, &cfg), Ok(today));
        assert_eq!(
            validate_drop_target(Some("1990-01-01"), today, &cfg),
            Ok(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap())
        );
        assert_eq!(
            validate_drop_target(Some("2999-12-31"), today, &cfg),
            Ok(NaiveDate::from_ymd_opt(2999, 12, 31).unwrap())
        );
    }

    #[test]
    fn test_task_defects_are_reported_in_order() {
        let mut t = CalendarTask::new("", "Essay");
        assert_eq!(validate_task_for_drag(&t), Err(TaskDefect::MissingId));

        t.task_id = "t1".into();
        t.title = "  ".into();
        assert_eq!(validate_task_for_drag(&t), Err(TaskDefect::MissingTitle));

        t.title = "Essay".into();
        assert_eq!(validate_task_for_drag(&t), Err(TaskDefect::MissingStart));

        t.start_time = Some("2026-03-04T09:00:00".into());
        assert_eq!(validate_task_for_drag(&t), Err(TaskDefect::MissingEnd));

        t.end_time = Some("whenever".into());
        assert_eq!(validate_task_for_drag(&t), Err(TaskDefect::InvalidEnd));

        t.end_time = Some("2026-03-04T08:00:00".into());
        assert_eq!(validate_task_for_drag(&t), Err(TaskDefect::StartNotBeforeEnd));
    }

    #[test]
    fn test_task_warnings() {
        let t = CalendarTask::new("t1", "Quick").at(day(4), 540, 550);
        let checked = validate_task_for_drag(&t).unwrap();
        assert_eq!(checked.warnings, vec![Warning::VeryShortTask, Warning::NoEstimate]);

        let t = CalendarTask::new("t2", "Normal").at(day(4), 540, 600).with_effort(60);
        assert!(validate_task_for_drag(&t).unwrap().warnings.is_empty());
    }

    #[test]
    fn test_drag_snaps_to_quarter_hour() {
        let p = prefs();
        let snap = ScheduleSnapshot::new();
        let cfg = PlannerConfig::default();
        let drag = DragRescheduler::new(Some(&p), &snap, &cfg).unwrap();

        let task = CalendarTask::new("t1", "Essay").at(day(4), 540, 600).with_effort(60);
        let a = accepted(drag.reschedule(&task, 65.0, day(4), now()).unwrap());
        assert_eq!(a.start, ts("2026-03-04T10:00"));
        assert_eq!(a.end, ts("2026-03-04T11:00"));
        assert_eq!((a.placement.start_minute, a.placement.end_minute), (600, 660));
    }

    #[test]
    fn test_drag_to_another_day_keeps_time_of_day() {
        let p = prefs();
        let snap = ScheduleSnapshot::new();
        let cfg = PlannerConfig::default();
        let drag = DragRescheduler::new(Some(&p), &snap, &cfg).unwrap();

        let task = CalendarTask::new("t1", "Essay").at(day(4), 540, 600);
        let a = accepted(drag.reschedule(&task, 0.0, day(5), now()).unwrap());
        assert_eq!(a.placement.date, day(5));
        assert_eq!(a.start, ts("2026-03-05T09:00"));
        assert!(a.warnings.contains(&Warning::NoEstimate));
    }

    #[test]
    fn test_drag_keeps_current_span_over_estimate() {
        let p = prefs();
        let snap = ScheduleSnapshot::new();
        let cfg = PlannerConfig::default();
        let drag = DragRescheduler::new(Some(&p), &snap, &cfg).unwrap();
        let task = CalendarTask::new("t1", "Essay")
            .at(day(4), 540, 600)
            .with_effort(30);

        let a = accepted(drag.reschedule(&task, 60.0, day(4), now()).unwrap());
        assert_eq!(a.start, ts("2026-03-04T10:00"));
        assert_eq!(a.end, ts("2026-03-04T11:00"));
        assert_eq!(a.placement.duration(), 60);
    }

    #[test]
    fn test_coarse_grid_does_not_overflow() {
        let p = prefs();
        let snap = ScheduleSnapshot::new();
        let cfg = PlannerConfig {
            grid_step_minutes: u32::MAX,
            ..PlannerConfig::default()
        };
        let drag = DragRescheduler::new(Some(&p), &snap, &cfg).unwrap();
        let task = CalendarTask::new("t1", "Essay").at(day(4), 540, 600);

        let a = accepted(drag.reschedule(&task, 20.0, day(4), now()).unwrap());
        assert_eq!(a.start, ts("2026-03-04T09:00"));
    }

    #[test]
    fn test_drag_onto_own_slot_does_not_self_conflict() {
        let p = prefs();
        let mut snap = ScheduleSnapshot::new();
        let task = CalendarTask::new("t1", "Essay").at(day(4), 540, 600);
        snap.insert_task(task.clone());
        let cfg = PlannerConfig::default();
        let drag = DragRescheduler::new(Some(&p), &snap, &cfg).unwrap();

        assert!(drag.reschedule(&task, 15.0, day(4), now()).unwrap().is_accepted());
    }

    #[test]
    fn test_conflicts_reject_unless_overrides_allowed() {
        let p = prefs();
        let mut snap = ScheduleSnapshot::new();
        snap.time_blocks
            .push(TimeBlock::new("b1", "Lecture", day(4), 900, 960));
        let task = CalendarTask::new("t1", "Essay").at(day(4), 600, 660);

        let strict = PlannerConfig::default();
        let drag = DragRescheduler::new(Some(&p), &snap, &strict).unwrap();

        // Onto lunch: overridable, still rejected by default.
        let lunch = drag.reschedule(&task, 150.0, day(4), now()).unwrap();
        assert!(!lunch.is_accepted());
        assert!(lunch.report().can_proceed);
        assert!(lunch.report().has_conflict_with(SourceKind::Meal));

        let lenient = PlannerConfig {
            allow_overrides: true,
            ..PlannerConfig::default()
        };
        let drag = DragRescheduler::new(Some(&p), &snap, &lenient).unwrap();
        let lunch = drag.reschedule(&task, 150.0, day(4), now()).unwrap();
        assert!(lunch.is_accepted());
        assert!(!lunch.report().is_valid);

        // Onto the lecture: never overridable.
        let lecture = drag.reschedule(&task, 300.0, day(4), now()).unwrap();
        assert!(!lecture.is_accepted());
        assert!(lecture.report().has_conflict_with(SourceKind::TimeBlock));
    }

    #[test]
    fn test_oversized_gesture_is_an_error() {
        let p = prefs();
        let snap = ScheduleSnapshot::new();
        let cfg = PlannerConfig::default();
        let drag = DragRescheduler::new(Some(&p), &snap, &cfg).unwrap();
        let task = CalendarTask::new("t1", "Essay").at(day(4), 540, 600);

        assert_eq!(
            drag.reschedule(&task, 1441.0, day(4), now()),
            Err(ScheduleError::GestureTooLarge { limit: 1440 })
        );
        assert_eq!(
            drag.reschedule(&task, f64::NAN, day(4), now()),
            Err(ScheduleError::GestureTooLarge { limit: 1440 })
        );
    }

    #[test]
    fn test_leaving_the_target_day_is_rejected() {
        let p = UserPreferences::sleep_only(ClockTime::hm(0, 0), ClockTime::hm(0, 0));
        let snap = ScheduleSnapshot::new();
        let cfg = PlannerConfig::default();
        let drag = DragRescheduler::new(Some(&p), &snap, &cfg).unwrap();
        let task = CalendarTask::new("t1", "Late").at(day(4), 1380, 1410);

        let out = drag.reschedule(&task, 90.0, day(4), now()).unwrap();
        assert_eq!(
            out.report().violation,
            Some(ConstraintViolation::LeavesTargetDay)
        );
    }

    #[test]
    fn test_malformed_task_is_an_error() {
        let p = prefs();
        let snap = ScheduleSnapshot::new();
        let cfg = PlannerConfig::default();
        let drag = DragRescheduler::new(Some(&p), &snap, &cfg).unwrap();

        let err = drag
            .reschedule(&CalendarTask::new("t1", "Unplaced"), 0.0, day(4), now())
            .unwrap_err();
        assert_eq!(err, ScheduleError::Task(TaskDefect::MissingStart));
    }

    #[test]
    fn test_missing_preferences_is_fatal() {
        let snap = ScheduleSnapshot::new();
        let cfg = PlannerConfig::default();
        assert!(matches!(
            DragRescheduler::new(None, &snap, &cfg),
            Err(ScheduleError::MissingPreferences)
        ));
    }

    #[test]
    fn test_drop_by_pixels() {
        let p = prefs();
        let snap = ScheduleSnapshot::new();
        let cfg = PlannerConfig::default();
        let drag = DragRescheduler::new(Some(&p), &snap, &cfg).unwrap();
        let task = CalendarTask::new("t1", "Essay").at(day(4), 540, 600);

        let a = accepted(
            drag.reschedule_drop(&task, 32.0, Some("2026-03-04"), now())
                .unwrap(),
        );
        assert_eq!(a.start, ts("2026-03-04T09:30"));
    }
}
