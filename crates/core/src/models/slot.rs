//! Time slots and per-weekday schedules

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::{ParseWeekdayError, Weekday};

/// Parse a wall-clock time in `HH:MM` (or `HH:MM:SS`) form
pub fn parse_time(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M").or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
}

/// Format a wall-clock time as `HH:MM`
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Serde adapter for `HH:MM` times
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_time(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_time(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional `HH:MM` times
pub(crate) mod hhmm_opt {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(time) => serializer.serialize_str(&super::format_time(*time)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| super::parse_time(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Start and end time of a class on a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl TimeSlot {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// Build a slot from two `HH:MM` strings
    pub fn parse(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self::new(parse_time(start)?, parse_time(end)?))
    }

    /// End strictly after start
    pub fn is_ordered(&self) -> bool {
        self.end_time > self.start_time
    }
}

/// Per-weekday time overrides for a recurring template
///
/// Weekdays missing from the map use the template's default slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, TimeSlot>",
    into = "BTreeMap<String, TimeSlot>"
)]
pub struct DailySchedule(BTreeMap<Weekday, TimeSlot>);

impl DailySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, day: Weekday, slot: TimeSlot) -> Self {
        self.0.insert(day, slot);
        self
    }

    pub fn get(&self, day: Weekday) -> Option<&TimeSlot> {
        self.0.get(&day)
    }

    pub fn insert(&mut self, day: Weekday, slot: TimeSlot) -> Option<TimeSlot> {
        self.0.insert(day, slot)
    }

    pub fn remove(&mut self, day: Weekday) -> Option<TimeSlot> {
        self.0.remove(&day)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &TimeSlot)> {
        self.0.iter().map(|(day, slot)| (*day, slot))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Error returned when a schedule key is not a usable weekday
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleKeyError {
    #[error(transparent)]
    UnknownDay(#[from] ParseWeekdayError),
    /// Two keys name the same weekday, e.g. `"Monday"` and `"mon"`
    #[error("daily_schedule.{0}: given more than once")]
    Duplicate(Weekday),
}

impl TryFrom<BTreeMap<String, TimeSlot>> for DailySchedule {
    type Error = ScheduleKeyError;

    fn try_from(raw: BTreeMap<String, TimeSlot>) -> Result<Self, Self::Error> {
        let mut days = BTreeMap::new();
        for (name, slot) in raw {
            let day: Weekday = name.parse()?;
            if days.insert(day, slot).is_some() {
                return Err(ScheduleKeyError::Duplicate(day));
            }
        }
        Ok(Self(days))
    }
}

impl From<DailySchedule> for BTreeMap<String, TimeSlot> {
    fn from(schedule: DailySchedule) -> Self {
        schedule
            .0
            .into_iter()
            .map(|(day, slot)| (day.as_str().to_string(), slot))
            .collect()
    }
}
