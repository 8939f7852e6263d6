//! Day bucketing for task statistics.
//!
//! A requested `[start, end]` range is cut into whole-day windows starting
//! at `start`. The last window is clamped to `end` instead of being rounded
//! up to a full day, so a 2.5-day range yields three windows with the third
//! only half a day long.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Default look-back when no start date is given.
pub const DEFAULT_WINDOW_SECS: i64 = 86_300;

/// Longest range, in day windows, a statistics request may cover.
pub const MAX_STATS_DAYS: i64 = 366;

/// One bucket of the statistics range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Task counts for one [`DayWindow`].
///
/// `succeeded`, `failed` and `running` are matched on the task's run date;
/// `waiting` is matched on its schedule date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub succeeded: i64,
    pub failed: i64,
    pub running: i64,
    pub waiting: i64,
}

/// Resolve optional millisecond timestamps into a concrete range.
///
/// `end` defaults to `now`; `start` defaults to [`DEFAULT_WINDOW_SECS`]
/// before `now`. A start after the end is rejected.
pub fn resolve_range(
    start_ms: Option<i64>,
    end_ms: Option<i64>,
    now: Timestamp,
) -> Result<(Timestamp, Timestamp), CoreError> {
    let end = match end_ms {
        Some(ms) => from_millis(ms, "end_date")?,
        None => now,
    };
    let start = match start_ms {
        Some(ms) => from_millis(ms, "start_date")?,
        None => now - Duration::seconds(DEFAULT_WINDOW_SECS),
    };

    if start > end {
        return Err(CoreError::OutOfRange(format!(
            "start date {start} is later than end date {end}"
        )));
    }
    Ok((start, end))
}

fn from_millis(ms: i64, field: &str) -> Result<Timestamp, CoreError> {
    DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(|| {
        CoreError::InvalidArgument(format!("{field} {ms} is not a valid timestamp"))
    })
}

/// Split `[start, end]` into day windows, oldest first.
///
/// An empty range (`start == end`) has no windows. A range needing more
/// than [`MAX_STATS_DAYS`] windows is rejected before any are built.
pub fn day_windows(start: Timestamp, end: Timestamp) -> Result<Vec<DayWindow>, CoreError> {
    if start > end {
        return Err(CoreError::OutOfRange(format!(
            "start date {start} is later than end date {end}"
        )));
    }

    let delta = end - start;
    let mut days = delta.num_days();
    if delta > Duration::days(days) {
        days += 1;
    }
    if days > MAX_STATS_DAYS {
        return Err(CoreError::OutOfRange(format!(
            "range of {days} days exceeds the maximum of {MAX_STATS_DAYS}"
        )));
    }

    let windows = (0..days)
        .map(|d| {
            let window_start = start + Duration::days(d);
            let window_end = if d == days - 1 {
                end
            } else {
                window_start + Duration::days(1)
            };
            DayWindow {
                start: window_start,
                end: window_end,
            }
        })
        .collect();
    Ok(windows)
}
