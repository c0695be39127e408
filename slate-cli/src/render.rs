//! Plain-text rendering of planner results for the terminal.

use slate_core::task::format_timestamp;
use slate_core::time::clock_string;
use slate_core::{CandidateSlot, ConflictReport, DragOutcome, ScheduleOutcome};

pub fn render_outcome(outcome: &ScheduleOutcome) -> String {
    let mut out = format!(
        "Placed {} task(s) over {} day(s)\n",
        outcome.assignments.len(),
        outcome.days_examined
    );
    for p in &outcome.assignments {
        out.push_str(&format!(
            "- {} {}-{} {}\n",
            p.date,
            clock_string(i64::from(p.start_minute)),
            end_clock(p.end_minute),
            p.task_id
        ));
    }
    if !outcome.unplaced.is_empty() {
        out.push_str(&format!("Unplaced: {}\n", outcome.unplaced.len()));
        for t in &outcome.unplaced {
            out.push_str(&format!("- {} ({})\n", t.task_id, t.title));
        }
    }
    out
}

pub fn render_report(report: &ConflictReport) -> String {
    let verdict = match (report.is_valid, report.can_proceed) {
        (true, _) => "ok",
        (false, true) => "conflict (overridable)",
        (false, false) => "rejected",
    };
    let mut out = format!("{verdict}: {}\n", report.message);
    for c in &report.conflicts {
        out.push_str(&format!(
            "- {} {} [{:?}{}]\n",
            c.kind.as_str(),
            c,
            c.severity,
            if c.overridable { ", overridable" } else { "" }
        ));
    }
    for w in &report.warnings {
        out.push_str(&format!("! {w}\n"));
    }
    out
}

pub fn render_drag(outcome: &DragOutcome) -> String {
    match outcome {
        DragOutcome::Accepted(a) => {
            let mut out = format!(
                "accepted: {} -> {} .. {}\n",
                a.placement.task_id,
                format_timestamp(&a.start),
                format_timestamp(&a.end)
            );
            for w in &a.warnings {
                out.push_str(&format!("! {w}\n"));
            }
            out
        }
        DragOutcome::Rejected(report) => render_report(report),
    }
}

pub fn render_slots(slots: &[CandidateSlot]) -> String {
    if slots.is_empty() {
        return "No free slots\n".to_string();
    }
    let mut out = String::new();
    for s in slots {
        out.push_str(&format!(
            "- {} {}-{}\n",
            s.start.date(),
            s.start.format("%H:%M"),
            s.end.format("%H:%M")
        ));
    }
    out
}

fn end_clock(minute: u32) -> String {
    if minute >= 1440 {
        "24:00".to_string()
    } else {
        clock_string(i64::from(minute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use slate_core::{
        BacklogTask, ClockTime, ConflictValidator, ConstraintViolation, Placement,
        ScheduleSnapshot, UserPreferences, ValidatorOptions,
    };

    #[test]
    fn test_outcome_lists_placements_and_unplaced() {
        let outcome = ScheduleOutcome {
            assignments: vec![Placement {
                task_id: "a".into(),
                date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
                start_minute: 420,
                end_minute: 1440,
            }],
            unplaced: vec![BacklogTask::new("b", "Essay")],
            days_examined: 35,
        };
        let text = render_outcome(&outcome);
        assert!(text.starts_with("Placed 1 task(s) over 35 day(s)\n"));
        assert!(text.contains("- 2026-03-04 07:00-24:00 a\n"));
        assert!(text.contains("Unplaced: 1\n- b (Essay)\n"));
    }

    #[test]
    fn test_rejected_report_shows_message() {
        let report = ConflictReport::rejected(ConstraintViolation::SpansMultipleDays);
        assert_eq!(
            render_report(&report),
            "rejected: Tasks cannot span multiple days\n"
        );
    }

    #[test]
    fn test_report_lists_conflicts_and_warnings() {
        let prefs = UserPreferences::sleep_only(ClockTime::hm(23, 0), ClockTime::hm(7, 0));
        let snap = ScheduleSnapshot::new();
        let v = ConflictValidator::new(&prefs, &snap, ValidatorOptions::default());
        let day = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let long_ago = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let text = render_report(&v.validate_on(day, 1350, 1410, None, long_ago));
        assert!(text.starts_with("rejected: "));
        assert!(text.contains("[High]\n"));
        assert!(text.ends_with("! Task scheduled late in the evening\n"));
    }

    #[test]
    fn test_no_slots() {
        assert_eq!(render_slots(&[]), "No free slots\n");
    }
}
