//! Busy intervals for a single day and the sort-and-sweep merge over them.
//!
//! Intervals are half-open `[start, end)` in minutes of day, with `end` allowed
//! to reach 1440. Merging collapses overlapping *and touching* intervals; the
//! merged tag keeps every constituent source so attribution is never lost.

use serde::{Deserialize, Serialize};

use crate::time::MINUTES_PER_DAY;

/// Where a busy interval comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Sleep,
    Meal,
    TimeBlock,
    Task,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Sleep => "sleep",
            SourceKind::Meal => "meal",
            SourceKind::TimeBlock => "time_block",
            SourceKind::Task => "task",
        }
    }

    /// Phrase used in conflict messages.
    pub fn describe(self) -> &'static str {
        match self {
            SourceKind::Sleep => "sleep time",
            SourceKind::Meal => "meal time",
            SourceKind::TimeBlock => "scheduled appointment",
            SourceKind::Task => "another task",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One concrete item behind an interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub kind: SourceKind,
    pub id: String,
    pub title: String,
}

impl SourceRef {
    pub fn new(kind: SourceKind, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceTag {
    /// All constituents share one kind.
    Uniform {
        kind: SourceKind,
        sources: Vec<SourceRef>,
    },
    /// Constituents of more than one kind.
    Mixed { sources: Vec<SourceRef> },
}

impl SourceTag {
    pub fn single(source: SourceRef) -> Self {
        SourceTag::Uniform {
            kind: source.kind,
            sources: vec![source],
        }
    }

    /// `None` for mixed tags.
    pub fn kind(&self) -> Option<SourceKind> {
        match self {
            SourceTag::Uniform { kind, .. } => Some(*kind),
            SourceTag::Mixed { .. } => None,
        }
    }

    pub fn sources(&self) -> &[SourceRef] {
        match self {
            SourceTag::Uniform { sources, .. } | SourceTag::Mixed { sources } => sources,
        }
    }

    pub fn label(&self) -> &'static str {
        self.kind().map_or("mixed", SourceKind::as_str)
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, SourceTag::Mixed { .. })
    }

    fn combine(self, other: SourceTag) -> SourceTag {
        let same_kind = match (self.kind(), other.kind()) {
            (Some(a), Some(b)) if a == b => Some(a),
            _ => None,
        };
        let mut sources = self.into_sources();
        sources.extend(other.into_sources());
        match same_kind {
            Some(kind) => SourceTag::Uniform { kind, sources },
            None => SourceTag::Mixed { sources },
        }
    }

    fn into_sources(self) -> Vec<SourceRef> {
        match self {
            SourceTag::Uniform { sources, .. } | SourceTag::Mixed { sources } => sources,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
    pub tag: SourceTag,
    pub severity: Severity,
    pub overridable: bool,
}

impl Interval {
    /// `None` unless `start < end <= 1440`.
    pub fn new(
        start: u32,
        end: u32,
        source: SourceRef,
        severity: Severity,
        overridable: bool,
    ) -> Option<Self> {
        if start >= end || end > MINUTES_PER_DAY {
            return None;
        }
        Some(Self {
            start,
            end,
            tag: SourceTag::single(source),
            severity,
            overridable,
        })
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Half-open overlap with `[start, end)`.
    pub fn overlaps(&self, start: u32, end: u32) -> bool {
        start < self.end && end > self.start
    }

    pub fn contains(&self, minute: u32) -> bool {
        self.start <= minute && minute < self.end
    }

    fn absorb(&mut self, next: Interval) {
        self.end = self.end.max(next.end);
        self.severity = self.severity.max(next.severity);
        self.overridable &= next.overridable;
        let tag = std::mem::replace(
            &mut self.tag,
            SourceTag::Mixed {
                sources: Vec::new(),
            },
        );
        self.tag = tag.combine(next.tag);
    }
}

/// Sort by start, then sweep, collapsing intervals whose start is at or before
/// the running end.
pub fn merge(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_by_key(|iv| iv.start);

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for next in intervals {
        match merged.last_mut() {
            Some(acc) if next.start <= acc.end => acc.absorb(next),
            _ => merged.push(next),
        }
    }
    merged
}

/// What lies at a given minute of a merged day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Free from `start` until `end` (the next busy start, or 1440).
    Free { start: u32, end: u32 },
    /// Inside a busy interval that lasts until `until`.
    Busy { until: u32 },
}

/// The occupied time of one calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_intervals(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }

    pub fn insert(&mut self, interval: Interval) {
        self.intervals.push(interval);
    }

    /// Normalised copy: sorted, non-overlapping, non-adjacent.
    pub fn merged(self) -> Self {
        Self {
            intervals: merge(self.intervals),
        }
    }

    /// Insert and re-merge, returning the grown set.
    pub fn with(mut self, interval: Interval) -> Self {
        self.insert(interval);
        self.merged()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// True when sorted with `end[i] < start[i+1]` throughout.
    pub fn is_normalized(&self) -> bool {
        self.intervals.windows(2).all(|w| w[0].end < w[1].start)
    }

    /// First interval starting at or after `minute`.
    pub fn next_busy_from(&self, minute: u32) -> Option<&Interval> {
        self.intervals.iter().find(|iv| iv.start >= minute)
    }

    /// Free window `[minute, next busy start)` or `[minute, 1440)`.
    pub fn free_window_from(&self, minute: u32) -> (u32, u32) {
        let end = self
            .next_busy_from(minute)
            .map_or(MINUTES_PER_DAY, |iv| iv.start);
        (minute, end)
    }

    /// Classify `minute` against a merged set.
    pub fn probe(&self, minute: u32) -> Probe {
        match self.intervals.iter().find(|iv| iv.end > minute) {
            Some(iv) if iv.start <= minute => Probe::Busy { until: iv.end },
            Some(iv) => Probe::Free {
                start: minute,
                end: iv.start,
            },
            None => Probe::Free {
                start: minute,
                end: MINUTES_PER_DAY,
            },
        }
    }

    /// Every minute covered by at least one interval, as a per-minute bitmap.
    pub fn coverage(&self) -> Vec<bool> {
        let mut covered = vec![false; MINUTES_PER_DAY as usize];
        for iv in &self.intervals {
            for m in iv.start..iv.end.min(MINUTES_PER_DAY) {
                covered[m as usize] = true;
            }
        }
        covered
    }
}

impl IntoIterator for IntervalSet {
    type Item = Interval;
    type IntoIter = std::vec::IntoIter<Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.into_iter()
    }
}

impl<'a> IntoIterator for &'a IntervalSet {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}
