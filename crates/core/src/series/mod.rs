//! Recurring series engine
//!
//! Turns templates into bookable occurrences and keeps the two in step:
//! - [`materialize`]: create a template and its occurrences
//! - [`mutate`]: edit a template, optionally pushing the edit to future occurrences
//! - [`retire`]: delete a template, optionally cascading to future occurrences
//!
//! Every operation runs inside one SQLite transaction. Operations that look at
//! "future" occurrences take today's local date; the `*_as_of` variants take an
//! explicit date instead.

mod materialize;
mod mutate;
mod retire;

use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::models::{DayChange, RecurringTemplate};

pub use materialize::plan_occurrences;
pub use mutate::orphan_action;

/// Result of creating a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesCreated {
    pub template_id: Uuid,
    pub occurrence_count: usize,
    pub generated_dates: Vec<NaiveDate>,
}

/// Options for [`SeriesService::update_series`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateOptions {
    /// Rewrite occurrences dated today or later
    pub propagate: bool,
    /// Weekday swap applied after the attribute replacement
    pub day_change: Option<DayChange>,
    /// Fail with a conflict unless the stored version matches
    pub expected_version: Option<i64>,
}

/// Result of an update or day change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesUpdate {
    pub template: RecurringTemplate,
    /// Future occurrences rewritten from the template
    pub propagated: usize,
    /// Future occurrences on weekdays the template no longer recurs on
    pub orphaned: usize,
}

/// Result of deleting a series
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRetired {
    pub template_id: Uuid,
    pub bookings_removed: usize,
    pub occurrences_removed: usize,
    pub members_adjusted: usize,
}

/// Series operations over one connection
pub struct SeriesService<'a> {
    conn: &'a Connection,
    config: &'a SchedulingConfig,
}

impl<'a> SeriesService<'a> {
    pub fn new(conn: &'a Connection, config: &'a SchedulingConfig) -> Self {
        Self { conn, config }
    }
}

/// Today's date on the local calendar
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, NaiveTime};

    use crate::models::{ClassDetails, TemplateFields, Weekday};

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// Valid fields starting Monday 2024-01-01
    pub fn fields(days: &[Weekday], end_date: Option<NaiveDate>) -> TemplateFields {
        TemplateFields {
            details: ClassDetails::new("Circuit".to_string(), "Morgan".to_string()),
            recurring_days: days.to_vec(),
            start_time: Some(hm(7, 30)),
            end_time: Some(hm(8, 30)),
            start_date: Some(date(2024, 1, 1)),
            end_date,
            ..TemplateFields::default()
        }
    }
}
