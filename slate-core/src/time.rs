//! Time utilities: minute-of-day arithmetic on a single civil clock.
//!
//! Every timestamp is reduced to a minute of the day in `0..=1439`. Offsets in
//! ISO-8601 input are normalised to UTC wall-clock time; no other zone handling
//! happens here.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::TimeError;

pub const MINUTES_PER_DAY: u32 = 1440;
pub const QUARTER_HOUR: u32 = 15;

/// Number of rows in the quarter-hour calendar grid.
const GRID_ROWS: u32 = MINUTES_PER_DAY / QUARTER_HOUR;

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601-like timestamp.
///
/// Accepts RFC 3339 (offset or `Z`, converted to UTC), zone-less date-times with
/// `T` or a space separator, and bare dates (midnight).
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, TimeError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(TimeError::Empty);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ndt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| TimeError::Unparseable(s.to_string()))
}

/// Parse a clock string like "07:30" (seconds optional) into a minute of day.
pub fn parse_clock(raw: &str) -> Result<u32, TimeError> {
    let s = raw.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map(|t| t.hour() * 60 + t.minute())
        .map_err(|_| TimeError::InvalidClock(s.to_string()))
}

/// Minute of day of an already parsed timestamp. Always in range.
pub fn minute_of(ts: &NaiveDateTime) -> u32 {
    ts.hour() * 60 + ts.minute()
}

/// Strict minute-of-day conversion: a full timestamp or a bare clock string.
pub fn try_minute_of_day(raw: &str) -> Result<u32, TimeError> {
    match parse_timestamp(raw) {
        Ok(ts) => Ok(minute_of(&ts)),
        Err(TimeError::Empty) => Err(TimeError::Empty),
        Err(err) => parse_clock(raw).map_err(|_| err),
    }
}

/// Soft minute-of-day conversion. Missing or malformed input yields `0`.
pub fn minute_of_day(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        warn!("minute_of_day: no timestamp, using 0");
        return 0;
    };
    match try_minute_of_day(raw) {
        Ok(m) => m,
        Err(err) => {
            warn!(input = raw, %err, "minute_of_day: falling back to 0");
            0
        }
    }
}

/// Clamp an arbitrary minute value into `0..=1439`.
pub fn clamp_minute(value: i64) -> u32 {
    let max = i64::from(MINUTES_PER_DAY - 1);
    if !(0..=max).contains(&value) {
        warn!(value, "minute out of range (0-1439), clamping");
    }
    value.clamp(0, max) as u32
}

/// Round to the nearest multiple of `step` minutes within the hour.
///
/// Seconds are dropped. `:53` rounds to the next hour's `:00`, and the date
/// rolls over when the next hour is on the following day.
pub fn round_to_grid(ts: NaiveDateTime, step: u32) -> NaiveDateTime {
    let hour_start = ts
        .date()
        .and_hms_opt(ts.hour(), 0, 0)
        .unwrap_or(ts);
    if step == 0 {
        return hour_start + Duration::minutes(i64::from(ts.minute()));
    }
    let rounded = ts.minute().saturating_add(step / 2) / step * step;
    hour_start + Duration::minutes(i64::from(rounded))
}

pub fn round_to_quarter_hour(ts: NaiveDateTime) -> NaiveDateTime {
    round_to_grid(ts, QUARTER_HOUR)
}

/// Format a minute of day as "HH:MM", clamping out-of-range input.
pub fn clock_string(minute: i64) -> String {
    let m = clamp_minute(minute);
    format!("{:02}:{:02}", m / 60, m % 60)
}

/// Minutes between two timestamps by time of day; `0` when `end <= start`.
pub fn duration_minutes(start: &str, end: &str) -> u32 {
    let s = minute_of_day(Some(start));
    let e = minute_of_day(Some(end));
    if e <= s {
        warn!(start, end, "duration_minutes: end is not after start");
        return 0;
    }
    e - s
}

/// Timestamp at `minute` on `date`; the minute is clamped into the day.
pub fn at_minute(date: NaiveDate, minute: u32) -> NaiveDateTime {
    let m = clamp_minute(i64::from(minute));
    date.and_time(NaiveTime::MIN) + Duration::minutes(i64::from(m))
}

/// Row span of an item on the quarter-hour calendar grid (1-based rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition {
    pub grid_start: u32,
    pub grid_end: u32,
}

pub fn grid_position(start: &str, end: &str) -> Result<GridPosition, TimeError> {
    let s = minute_of_day(Some(start));
    let e = minute_of_day(Some(end));
    if s >= e {
        return Err(TimeError::StartNotBeforeEnd);
    }

    let grid_start = (s / QUARTER_HOUR + 1).max(1);
    let grid_end = (e.div_ceil(QUARTER_HOUR) + 1).max(grid_start + 1);
    if grid_start > GRID_ROWS || grid_end > GRID_ROWS + 1 {
        return Err(TimeError::BeyondDay);
    }

    Ok(GridPosition {
        grid_start,
        grid_end,
    })
}

/// A time of day, serialized as "HH:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    pub fn from_minute(minute: u32) -> Self {
        Self(clamp_minute(i64::from(minute)))
    }

    pub fn hm(hour: u32, minute: u32) -> Self {
        Self::from_minute(hour * 60 + minute)
    }

    pub fn minute(self) -> u32 {
        self.0
    }
}

impl TryFrom<String> for ClockTime {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_clock(&value).map(ClockTime)
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}
