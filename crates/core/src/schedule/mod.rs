//! Calendar logic for recurring series
//!
//! Pure functions only: no storage access and no clock reads.

mod expand;
mod resolve;

pub use expand::{expand_dates, horizon_end};
pub use resolve::resolve_slot;

use chrono::{Datelike, NaiveDate};

use crate::models::Weekday;

/// Weekday of a calendar date
pub fn weekday_of(date: NaiveDate) -> Weekday {
    date.weekday().into()
}
