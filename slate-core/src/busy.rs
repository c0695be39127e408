//! Builds a day's busy intervals from sleep, meals, time blocks and tasks.
//!
//! Output is unmerged: the scheduler merges it to find gaps, the validator keeps
//! each interval separate so every conflict names its own source.

use chrono::NaiveDate;
use tracing::warn;

use crate::interval::{Interval, IntervalSet, Severity, SourceKind, SourceRef};
use crate::preferences::UserPreferences;
use crate::task::{CalendarTask, ScheduleSnapshot, TimeBlock};
use crate::time::{MINUTES_PER_DAY, minute_of_day, parse_timestamp};

/// Sleep as one interval, or two when it wraps midnight.
pub fn sleep_intervals(prefs: &UserPreferences) -> Vec<Interval> {
    let start = prefs.sleep_start.minute();
    let end = prefs.sleep_end.minute();

    let spans: Vec<(u32, u32, &str)> = if start > end {
        vec![(start, MINUTES_PER_DAY, "sleep-1"), (0, end, "sleep-2")]
    } else {
        vec![(start, end, "sleep")]
    };

    spans
        .into_iter()
        .filter_map(|(s, e, id)| {
            Interval::new(
                s,
                e,
                SourceRef::new(SourceKind::Sleep, id, "Sleep Time"),
                Severity::High,
                false,
            )
        })
        .collect()
}

/// One interval per meal, cut off at midnight.
pub fn meal_intervals(prefs: &UserPreferences) -> Vec<Interval> {
    prefs
        .meal_start_times
        .iter()
        .enumerate()
        .filter_map(|(idx, meal)| {
            let start = meal.minute();
            let end = start.saturating_add(prefs.meal_duration).min(MINUTES_PER_DAY);
            let iv = Interval::new(
                start,
                end,
                SourceRef::new(SourceKind::Meal, format!("meal-{idx}"), format!("Meal Time {}", idx + 1)),
                Severity::Medium,
                true,
            );
            if iv.is_none() {
                warn!(meal = %meal, duration = prefs.meal_duration, "skipping empty meal window");
            }
            iv
        })
        .collect()
}

/// Intervals for the fixed blocks that start on `date`.
pub fn time_block_intervals<'a>(
    date: NaiveDate,
    blocks: impl IntoIterator<Item = &'a TimeBlock>,
) -> Vec<Interval> {
    blocks
        .into_iter()
        .filter(|b| b.date() == Some(date))
        .filter_map(|b| {
            let (start, end) = span_on(date, Some(b.start_time.as_str()), Some(b.end_time.as_str()));
            let iv = Interval::new(
                start,
                end,
                SourceRef::new(SourceKind::TimeBlock, b.block_id.clone(), b.title.clone()),
                Severity::High,
                false,
            );
            if iv.is_none() {
                warn!(block_id = %b.block_id, "dropping time block with empty span");
            }
            iv
        })
        .collect()
}

/// Intervals for placed tasks, skipping `exclude_task_id` and tasks without
/// both a start and an end.
pub fn task_intervals(
    date: NaiveDate,
    tasks: &[CalendarTask],
    exclude_task_id: Option<&str>,
) -> Vec<Interval> {
    tasks
        .iter()
        .filter(|t| Some(t.task_id.as_str()) != exclude_task_id)
        .filter(|t| t.start_time.is_some() && t.end_time.is_some())
        .filter_map(|t| {
            let (start, end) = span_on(date, t.start_time.as_deref(), t.end_time.as_deref());
            let severity = if t.is_stressful {
                Severity::High
            } else {
                Severity::Medium
            };
            let iv = Interval::new(
                start,
                end,
                SourceRef::new(SourceKind::Task, t.task_id.clone(), t.title.clone()),
                severity,
                true,
            );
            if iv.is_none() {
                warn!(task_id = %t.task_id, "dropping task with empty span");
            }
            iv
        })
        .collect()
}

/// Minute span of a timestamp pair on `date`. An end on a later date (for
/// example exactly midnight) becomes 1440.
fn span_on(date: NaiveDate, start: Option<&str>, end: Option<&str>) -> (u32, u32) {
    let s = minute_of_day(start);
    let e = match end.map(parse_timestamp) {
        Some(Ok(ts)) if ts.date() > date => MINUTES_PER_DAY,
        _ => minute_of_day(end),
    };
    (s, e)
}

/// Assembles busy intervals for any day from one preferences/snapshot pair.
#[derive(Debug, Clone, Copy)]
pub struct BusyIntervalBuilder<'a> {
    prefs: &'a UserPreferences,
    snapshot: &'a ScheduleSnapshot,
}

impl<'a> BusyIntervalBuilder<'a> {
    pub fn new(prefs: &'a UserPreferences, snapshot: &'a ScheduleSnapshot) -> Self {
        Self { prefs, snapshot }
    }

    pub fn preferences(&self) -> &'a UserPreferences {
        self.prefs
    }

    pub fn snapshot(&self) -> &'a ScheduleSnapshot {
        self.snapshot
    }

    /// All four sources for `date`, unmerged.
    pub fn build(&self, date: NaiveDate, exclude_task_id: Option<&str>) -> Vec<Interval> {
        let mut out = sleep_intervals(self.prefs);
        out.extend(meal_intervals(self.prefs));
        out.extend(time_block_intervals(date, &self.snapshot.time_blocks));
        out.extend(task_intervals(
            date,
            self.snapshot.tasks_on(date),
            exclude_task_id,
        ));
        out
    }

    /// Merged busy set for `date`.
    pub fn build_set(&self, date: NaiveDate, exclude_task_id: Option<&str>) -> IntervalSet {
        IntervalSet::from_intervals(self.build(date, exclude_task_id)).merged()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ClockTime;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()
    }

    #[test]
    fn test_sleep_wrapping_midnight_splits_in_two() {
        let prefs = UserPreferences::sleep_only(ClockTime::hm(23, 0), ClockTime::hm(7, 0));
        let out = sleep_intervals(&prefs);
        assert_eq!(out.len(), 2);
        assert_eq!((out[0].start, out[0].end), (1380, 1440));
        assert_eq!((out[1].start, out[1].end), (0, 420));
        assert!(out.iter().all(|i| i.severity == Severity::High && !i.overridable));
    }

    #[test]
    fn test_daytime_sleep_is_one_interval() {
        let prefs = UserPreferences::sleep_only(ClockTime::hm(1, 0), ClockTime::hm(9, 0));
        let out = sleep_intervals(&prefs);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].start, out[0].end), (60, 540));
    }

    #[test]
    fn test_meals_are_clamped_to_midnight() {
        let prefs = UserPreferences {
            meal_start_times: vec![ClockTime::hm(12, 30), ClockTime::hm(23, 30)],
            meal_duration: 60,
            ..UserPreferences::default()
        };
        let out = meal_intervals(&prefs);
        assert_eq!((out[0].start, out[0].end), (750, 810));
        assert_eq!((out[1].start, out[1].end), (1410, 1440));
        assert_eq!(out[1].tag.sources()[0].title, "Meal Time 2");
    }

    #[test]
    fn test_blocks_are_filtered_by_date() {
        let other = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let blocks = vec![
            TimeBlock::new("b1", "Lecture", day(), 600, 690),
            TimeBlock::new("b2", "Lab", other, 600, 690),
        ];
        let out = time_block_intervals(day(), &blocks);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tag.sources()[0].id, "b1");
    }

    #[test]
    fn test_block_ending_at_midnight_reaches_day_end() {
        let blocks = vec![TimeBlock::new("late", "Shift", day(), 1320, 1440)];
        let out = time_block_intervals(day(), &blocks);
        assert_eq!((out[0].start, out[0].end), (1320, 1440));
    }

    #[test]
    fn test_tasks_skip_excluded_unplaced_and_malformed() {
        let mut broken = CalendarTask::new("bad", "Broken").at(day(), 600, 660);
        broken.end_time = Some("garbage".into());
        let tasks = vec![
            CalendarTask::new("a", "Essay").at(day(), 540, 600).stressful(),
            CalendarTask::new("b", "Moving").at(day(), 700, 760),
            CalendarTask::new("c", "Unplaced"),
            broken,
        ];

        let out = task_intervals(day(), &tasks, Some("b"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].severity, Severity::High);
        assert!(out[0].overridable);
    }

    #[test]
    fn test_builder_collects_all_sources() {
        let prefs = UserPreferences::default();
        let mut snap = ScheduleSnapshot::new();
        snap.insert_task(CalendarTask::new("t", "Read").at(day(), 540, 600));
        snap.time_blocks
            .push(TimeBlock::new("b", "Dentist", day(), 900, 960));

        let builder = BusyIntervalBuilder::new(&prefs, &snap);
        let raw = builder.build(day(), None);
        // 2 sleep + 3 meals + 1 block + 1 task
        assert_eq!(raw.len(), 7);

        let merged = builder.build_set(day(), None);
        assert!(merged.is_normalized());
        assert!(merged.len() < raw.len());
    }
}
