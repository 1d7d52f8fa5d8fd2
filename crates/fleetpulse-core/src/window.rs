//! Comparison window definition.

use chrono::{DateTime, Duration, LocalResult, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Bucketing granularity for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucketing {
    Day,
    Hour,
}

/// The two comparison intervals: "today so far" and the same elapsed portion
/// exactly 7x24h earlier. All bounds are UTC instants; the day boundary is
/// taken in the declared reporting timezone.
///
/// Invariants: `today_end - today_start == last_week_end - last_week_start`
/// and `last_week_start == today_start - 7 days`. Recomputed on every fetch
/// so `today_end` tracks the caller's current instant; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonWindow {
    pub reference_instant: DateTime<Utc>,
    pub today_start: DateTime<Utc>,
    pub today_end: DateTime<Utc>,
    pub last_week_start: DateTime<Utc>,
    pub last_week_end: DateTime<Utc>,
}

impl ComparisonWindow {
    /// Pure function of the reference instant and the reporting timezone.
    pub fn for_reference(reference: DateTime<Utc>, tz: Tz) -> Self {
        let today_start = local_midnight(reference, tz);
        let week = Duration::days(7);
        Self {
            reference_instant: reference,
            today_start,
            today_end: reference,
            last_week_start: today_start - week,
            last_week_end: reference - week,
        }
    }

    pub fn to_metadata(&self) -> WindowMeta {
        WindowMeta {
            reference_instant: self.reference_instant.to_rfc3339(),
            today: [self.today_start.to_rfc3339(), self.today_end.to_rfc3339()],
            last_week: [
                self.last_week_start.to_rfc3339(),
                self.last_week_end.to_rfc3339(),
            ],
        }
    }
}

/// Window bounds in wire form, attached to report responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowMeta {
    pub reference_instant: String,
    pub today: [String; 2],
    pub last_week: [String; 2],
}

/// Midnight of the calendar day containing `instant`, in `tz`, as a UTC
/// instant. DST can make local midnight ambiguous or skip it entirely; the
/// earliest valid instant of that day is used.
fn local_midnight(instant: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let day = instant.with_timezone(&tz).date_naive();
    let mut candidate = day.and_hms_opt(0, 0, 0).unwrap_or_default();
    for _ in 0..8 {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                return dt.with_timezone(&Utc)
            }
            LocalResult::None => candidate += Duration::minutes(30),
        }
    }
    // Unreachable for real tzdata; fall back to treating midnight as UTC.
    Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Hour-of-day of `instant` in the reporting timezone. The single place the
/// current hour is derived for truncating not-yet-populated "today" hours.
pub fn hour_in_tz(instant: DateTime<Utc>, tz: Tz) -> u32 {
    instant.with_timezone(&tz).hour()
}
