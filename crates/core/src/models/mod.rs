//! Data models for the class scheduling engine

mod booking;
mod details;
mod member;
mod occurrence;
mod slot;
mod template;
mod weekday;

pub use booking::*;
pub use details::*;
pub use member::*;
pub use occurrence::*;
pub use slot::{format_time, parse_time, DailySchedule, ScheduleKeyError, TimeSlot};
pub use template::*;
pub use weekday::*;
