//! Recurring class template - the definition a series is generated from

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::slot::{hhmm, hhmm_opt};
use super::{ClassDetails, DailySchedule, TimeSlot, Weekday};
use crate::error::{Error, Result};
use crate::schedule::resolve_slot;

/// A recurring series definition. Not bookable itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTemplate {
    pub id: Uuid,
    #[serde(flatten)]
    pub details: ClassDetails,
    /// Non-empty, no duplicates
    pub recurring_days: Vec<Weekday>,
    pub daily_schedule: DailySchedule,
    /// Used for any recurring day without a `daily_schedule` entry
    #[serde(flatten)]
    pub default_slot: TimeSlot,
    pub start_date: NaiveDate,
    /// `None` recurs indefinitely (generation is still capped)
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    /// Incremented on every write; used for optimistic concurrency
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin-supplied template attributes, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateFields {
    #[serde(flatten)]
    pub details: ClassDetails,
    pub recurring_days: Vec<Weekday>,
    pub daily_schedule: DailySchedule,
    #[serde(with = "hhmm_opt")]
    pub start_time: Option<NaiveTime>,
    #[serde(with = "hhmm_opt")]
    pub end_time: Option<NaiveTime>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl Default for TemplateFields {
    fn default() -> Self {
        Self {
            details: ClassDetails::default(),
            recurring_days: Vec::new(),
            daily_schedule: DailySchedule::new(),
            start_time: None,
            end_time: None,
            start_date: None,
            end_date: None,
            is_active: true,
        }
    }
}

/// Swap one recurring weekday for another, with the new day's times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayChange {
    pub old: Weekday,
    pub new: Weekday,
    #[serde(with = "hhmm")]
    pub new_start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub new_end_time: NaiveTime,
}

impl DayChange {
    pub fn new(old: Weekday, new: Weekday, slot: TimeSlot) -> Self {
        Self {
            old,
            new,
            new_start_time: slot.start_time,
            new_end_time: slot.end_time,
        }
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.new_start_time, self.new_end_time)
    }
}

/// Validated attribute set, ready to be written onto a template
struct ValidFields {
    details: ClassDetails,
    recurring_days: Vec<Weekday>,
    daily_schedule: DailySchedule,
    default_slot: TimeSlot,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    is_active: bool,
}

fn missing(field: &str) -> Error {
    Error::Validation(format!("{field} is required"))
}

impl TemplateFields {
    fn validate(self) -> Result<ValidFields> {
        if self.details.title.trim().is_empty() {
            return Err(missing("title"));
        }
        if self.details.instructor.trim().is_empty() {
            return Err(missing("instructor"));
        }

        // Dedupe, keeping first-seen order
        let mut recurring_days = Vec::with_capacity(self.recurring_days.len());
        for day in self.recurring_days {
            if !recurring_days.contains(&day) {
                recurring_days.push(day);
            }
        }
        if recurring_days.is_empty() {
            return Err(missing("recurring_days"));
        }

        let start_date = self.start_date.ok_or_else(|| missing("start_date"))?;
        let start_time = self.start_time.ok_or_else(|| missing("start_time"))?;
        let end_time = self.end_time.ok_or_else(|| missing("end_time"))?;

        let default_slot = TimeSlot::new(start_time, end_time);
        if !default_slot.is_ordered() {
            return Err(Error::Validation(
                "end_time must be after start_time".to_string(),
            ));
        }

        if let Some(end_date) = self.end_date {
            if end_date < start_date {
                return Err(Error::Validation(
                    "end_date must not be before start_date".to_string(),
                ));
            }
        }

        for (day, slot) in self.daily_schedule.iter() {
            if !recurring_days.contains(&day) {
                return Err(Error::Validation(format!(
                    "daily_schedule.{day}: not one of recurring_days"
                )));
            }
            if !slot.is_ordered() {
                return Err(Error::Validation(format!(
                    "daily_schedule.{day}: end_time must be after start_time"
                )));
            }
        }

        if self.details.max_participants == 0 {
            return Err(Error::Validation(
                "max_participants must be at least 1".to_string(),
            ));
        }
        if let Some(level) = self.details.intensity_level {
            if !(1..=10).contains(&level) {
                return Err(Error::Validation(
                    "intensity_level must be between 1 and 10".to_string(),
                ));
            }
        }

        Ok(ValidFields {
            details: self.details,
            recurring_days,
            daily_schedule: self.daily_schedule,
            default_slot,
            start_date,
            end_date: self.end_date,
            is_active: self.is_active,
        })
    }
}

impl RecurringTemplate {
    /// Validate admin input and build a new, not yet persisted template
    pub fn from_fields(fields: TemplateFields) -> Result<Self> {
        let valid = fields.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            details: valid.details,
            recurring_days: valid.recurring_days,
            daily_schedule: valid.daily_schedule,
            default_slot: valid.default_slot,
            start_date: valid.start_date,
            end_date: valid.end_date,
            is_active: valid.is_active,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Full attribute replacement; identity, version and creation time are
    /// kept. On a validation error the template is left unchanged.
    pub fn replace_fields(&mut self, fields: TemplateFields) -> Result<()> {
        let valid = fields.validate()?;
        self.details = valid.details;
        self.recurring_days = valid.recurring_days;
        self.daily_schedule = valid.daily_schedule;
        self.default_slot = valid.default_slot;
        self.start_date = valid.start_date;
        self.end_date = valid.end_date;
        self.is_active = valid.is_active;
        Ok(())
    }

    /// Replace `change.old` with `change.new` in the recurring days and give
    /// the new day its own schedule entry. Nothing changes on error.
    pub fn apply_day_change(&mut self, change: &DayChange) -> Result<()> {
        let slot = change.slot();
        if !slot.is_ordered() {
            return Err(Error::Validation(
                "day_change: new_end_time must be after new_start_time".to_string(),
            ));
        }
        let position = self
            .recurring_days
            .iter()
            .position(|day| *day == change.old)
            .ok_or_else(|| {
                Error::Validation(format!("day_change.old: {} is not a recurring day", change.old))
            })?;
        if change.new != change.old && self.recurring_days.contains(&change.new) {
            return Err(Error::Validation(format!(
                "day_change.new: {} is already a recurring day",
                change.new
            )));
        }

        self.recurring_days[position] = change.new;
        self.daily_schedule.remove(change.old);
        self.daily_schedule.insert(change.new, slot);
        Ok(())
    }

    /// Current editable attributes, as an edit form would start from
    pub fn fields(&self) -> TemplateFields {
        TemplateFields {
            details: self.details.clone(),
            recurring_days: self.recurring_days.clone(),
            daily_schedule: self.daily_schedule.clone(),
            start_time: Some(self.default_slot.start_time),
            end_time: Some(self.default_slot.end_time),
            start_date: Some(self.start_date),
            end_date: self.end_date,
            is_active: self.is_active,
        }
    }

    /// True when `date` lies within `[start_date, end_date]`
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.map_or(true, |end| date <= end)
    }

    pub fn recurs_on(&self, day: Weekday) -> bool {
        self.recurring_days.contains(&day)
    }

    /// Times for `day`, or `None` when the template no longer recurs on it
    pub fn slot_for(&self, day: Weekday) -> Option<TimeSlot> {
        self.recurs_on(day)
            .then(|| resolve_slot(day, &self.daily_schedule, self.default_slot))
    }

    /// Record a write: bump the version and the update timestamp
    pub fn mark_updated(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> TemplateFields {
        TemplateFields {
            details: ClassDetails::new("Morning HIIT".to_string(), "Sam".to_string()),
            recurring_days: vec![Weekday::Monday, Weekday::Wednesday],
            start_time: Some(NaiveTime::from_hms_opt(7, 30, 0).unwrap()),
            end_time: Some(NaiveTime::from_hms_opt(8, 30, 0).unwrap()),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..TemplateFields::default()
        }
    }

    fn validation_message(fields: TemplateFields) -> String {
        match RecurringTemplate::from_fields(fields) {
            Err(Error::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_fields_valid() {
        let template = RecurringTemplate::from_fields(fields()).unwrap();
        assert_eq!(template.version, 1);
        assert_eq!(template.recurring_days.len(), 2);
        assert!(template.is_active);
    }

    #[test]
    fn test_missing_fields_are_named() {
        let mut f = fields();
        f.details.title = "  ".to_string();
        assert_eq!(validation_message(f), "title is required");

        let mut f = fields();
        f.details.instructor.clear();
        assert_eq!(validation_message(f), "instructor is required");

        let mut f = fields();
        f.recurring_days.clear();
        assert_eq!(validation_message(f), "recurring_days is required");

        let mut f = fields();
        f.start_date = None;
        assert_eq!(validation_message(f), "start_date is required");
    }

    #[test]
    fn test_duplicate_days_are_collapsed() {
        let mut f = fields();
        f.recurring_days = vec![Weekday::Friday, Weekday::Monday, Weekday::Friday];
        let template = RecurringTemplate::from_fields(f).unwrap();
        assert_eq!(template.recurring_days, vec![Weekday::Friday, Weekday::Monday]);
    }

    #[test]
    fn test_schedule_entry_for_non_recurring_day_rejected() {
        let mut f = fields();
        f.daily_schedule = DailySchedule::new()
            .with(Weekday::Sunday, TimeSlot::parse("10:00", "11:00").unwrap());
        assert!(validation_message(f).starts_with("daily_schedule.sunday"));
    }

    #[test]
    fn test_end_date_before_start_rejected() {
        let mut f = fields();
        f.end_date = NaiveDate::from_ymd_opt(2023, 12, 1);
        assert_eq!(
            validation_message(f),
            "end_date must not be before start_date"
        );
    }

    #[test]
    fn test_slot_for_falls_back_to_default() {
        let mut f = fields();
        let evening = TimeSlot::parse("18:00", "19:00").unwrap();
        f.daily_schedule = DailySchedule::new().with(Weekday::Wednesday, evening);
        let template = RecurringTemplate::from_fields(f).unwrap();

        assert_eq!(template.slot_for(Weekday::Wednesday), Some(evening));
        assert_eq!(template.slot_for(Weekday::Monday), Some(template.default_slot));
        assert_eq!(template.slot_for(Weekday::Friday), None);
    }

    #[test]
    fn test_covers_date_range() {
        let mut f = fields();
        f.end_date = NaiveDate::from_ymd_opt(2024, 1, 31);
        let template = RecurringTemplate::from_fields(f).unwrap();

        assert!(template.covers(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(template.covers(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        assert!(!template.covers(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
        assert!(!template.covers(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
    }

    #[test]
    fn test_apply_day_change() {
        let mut template = RecurringTemplate::from_fields(fields()).unwrap();
        let slot = TimeSlot::parse("12:00", "13:00").unwrap();
        template
            .apply_day_change(&DayChange::new(Weekday::Wednesday, Weekday::Thursday, slot))
            .unwrap();

        assert_eq!(template.recurring_days, vec![Weekday::Monday, Weekday::Thursday]);
        assert_eq!(template.daily_schedule.get(Weekday::Thursday), Some(&slot));
        assert!(template.daily_schedule.get(Weekday::Wednesday).is_none());
        assert_eq!(template.version, 1);

        template.mark_updated();
        assert_eq!(template.version, 2);
    }

    #[test]
    fn test_apply_day_change_is_all_or_nothing() {
        let mut template = RecurringTemplate::from_fields(fields()).unwrap();
        let before = template.clone();
        let slot = TimeSlot::parse("12:00", "13:00").unwrap();

        // Old day not recurring
        assert!(template
            .apply_day_change(&DayChange::new(Weekday::Friday, Weekday::Saturday, slot))
            .is_err());
        // New day already present
        assert!(template
            .apply_day_change(&DayChange::new(Weekday::Monday, Weekday::Wednesday, slot))
            .is_err());

        assert_eq!(template, before);
    }

    #[test]
    fn test_fields_deserialize_from_admin_json() {
        let json = r#"{
            "title": "Spin",
            "instructor": "Alex",
            "recurring_days": ["Friday"],
            "start_time": "07:30",
            "end_time": "08:30",
            "start_date": "2024-03-01",
            "price_per_session": 12.5
        }"#;
        let f: TemplateFields = serde_json::from_str(json).unwrap();
        assert_eq!(f.details.title, "Spin");
        assert_eq!(f.details.price_per_session, 12.5);
        assert_eq!(f.recurring_days, vec![Weekday::Friday]);
        assert!(f.is_active);
        assert!(f.end_date.is_none());
    }
}
