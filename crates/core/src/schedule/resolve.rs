//! Per-day schedule resolution

use crate::models::{DailySchedule, TimeSlot, Weekday};

/// Times to use for `day`: its explicit schedule entry, else the default slot.
///
/// Deterministic; materialization and propagation both go through here.
pub fn resolve_slot(day: Weekday, schedule: &DailySchedule, default: TimeSlot) -> TimeSlot {
    schedule.get(day).copied().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_entry_wins() {
        let default = TimeSlot::parse("07:30", "08:30").unwrap();
        let evening = TimeSlot::parse("18:00", "19:00").unwrap();
        let schedule = DailySchedule::new().with(Weekday::Wednesday, evening);

        assert_eq!(resolve_slot(Weekday::Wednesday, &schedule, default), evening);
        assert_eq!(resolve_slot(Weekday::Monday, &schedule, default), default);
    }

    #[test]
    fn test_empty_schedule_uses_default() {
        let default = TimeSlot::parse("07:30", "08:30").unwrap();
        let schedule = DailySchedule::new();
        assert_eq!(resolve_slot(Weekday::Friday, &schedule, default), default);
    }

    #[test]
    fn test_repeated_resolution_is_identical() {
        let default = TimeSlot::parse("06:00", "07:00").unwrap();
        let schedule = DailySchedule::new()
            .with(Weekday::Tuesday, TimeSlot::parse("12:00", "12:45").unwrap());

        for day in Weekday::ALL {
            let first = resolve_slot(day, &schedule, default);
            let second = resolve_slot(day, &schedule.clone(), default);
            assert_eq!(first, second);
        }
    }
}
