//! Calendar expansion: (start, end, weekdays) -> concrete dates

use chrono::{Days, NaiveDate};
use tracing::debug;

use super::weekday_of;
use crate::config::GenerationLimits;
use crate::models::Weekday;

/// Last date considered for an open-ended series starting on `start`
pub fn horizon_end(start: NaiveDate, limits: &GenerationLimits) -> NaiveDate {
    let limits = limits.clamped();
    start
        .checked_add_days(Days::new(u64::from(limits.open_ended_horizon_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Every date in `[start, end]` (inclusive) whose weekday is in `days`, ascending.
///
/// A missing `end` means `start + open_ended_horizon_days`. The walk stops after
/// `max_day_steps` days or `max_occurrences` matches, whichever comes first.
/// Limits above the hard maximums in [`crate::config`] are clamped.
/// Dates are naive calendar days, so stepping one day never skips or repeats a
/// date regardless of any UTC offset.
///
/// An empty result is valid here; callers decide whether that is an error.
pub fn expand_dates(
    start: NaiveDate,
    end: Option<NaiveDate>,
    days: &[Weekday],
    limits: &GenerationLimits,
) -> Vec<NaiveDate> {
    let limits = limits.clamped();
    let end = end.unwrap_or_else(|| horizon_end(start, &limits));

    let dates: Vec<NaiveDate> = start
        .iter_days()
        .take(limits.max_day_steps)
        .take_while(|date| *date <= end)
        .filter(|date| days.contains(&weekday_of(*date)))
        .take(limits.max_occurrences)
        .collect();

    debug!(%start, %end, count = dates.len(), "Expanded recurrence");
    dates
}
