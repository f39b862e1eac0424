//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{ClassOccurrence, RecurringTemplate};

/// Validate that a template's recurrence definition is internally consistent
pub fn assert_template_invariants(template: &RecurringTemplate) {
    debug_assert!(
        !template.recurring_days.is_empty(),
        "Template {} has no recurring days",
        template.id
    );

    // No duplicate weekdays
    for (i, day) in template.recurring_days.iter().enumerate() {
        debug_assert!(
            !template.recurring_days[..i].contains(day),
            "Template {} lists {} twice",
            template.id,
            day
        );
    }

    debug_assert!(
        template.default_slot.is_ordered(),
        "Template {} default slot ends before it starts",
        template.id
    );

    if let Some(end_date) = template.end_date {
        debug_assert!(
            template.start_date <= end_date,
            "Template {} ends ({}) before it starts ({})",
            template.id,
            end_date,
            template.start_date
        );
    }

    for (day, _) in template.daily_schedule.iter() {
        debug_assert!(
            template.recurs_on(day),
            "Template {} has a schedule entry for non-recurring {}",
            template.id,
            day
        );
    }

    debug_assert!(
        template.version >= 1,
        "Template {} has version {}",
        template.id,
        template.version
    );
}

/// Validate freshly planned occurrences against the template they came from
pub fn assert_generated_occurrences_invariants(
    template: &RecurringTemplate,
    occurrences: &[ClassOccurrence],
) {
    for occurrence in occurrences {
        debug_assert!(
            template.recurs_on(occurrence.weekday()),
            "Occurrence on {} falls on {}, not a recurring day of template {}",
            occurrence.date,
            occurrence.weekday(),
            template.id
        );

        debug_assert!(
            occurrence.date >= template.start_date
                && template.end_date.map_or(true, |end| occurrence.date <= end),
            "Occurrence on {} is outside the range of template {}",
            occurrence.date,
            template.id
        );

        debug_assert!(
            occurrence.parent_recurring_id == Some(template.id),
            "Occurrence {} is not linked to template {}",
            occurrence.id,
            template.id
        );

        debug_assert!(
            occurrence.current_participants == 0,
            "New occurrence {} starts with {} participants",
            occurrence.id,
            occurrence.current_participants
        );
    }

    // Dates strictly increasing
    for pair in occurrences.windows(2) {
        debug_assert!(
            pair[0].date < pair[1].date,
            "Template {} generated {} after {}",
            template.id,
            pair[1].date,
            pair[0].date
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassDetails, TemplateFields, TimeSlot, Weekday};
    use chrono::{NaiveDate, NaiveTime};

    fn make_template() -> RecurringTemplate {
        RecurringTemplate::from_fields(TemplateFields {
            details: ClassDetails::new("Yoga".to_string(), "Kim".to_string()),
            recurring_days: vec![Weekday::Tuesday],
            start_time: NaiveTime::from_hms_opt(17, 0, 0),
            end_time: NaiveTime::from_hms_opt(18, 0, 0),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            ..TemplateFields::default()
        })
        .unwrap()
    }

    fn on(template: &RecurringTemplate, y: i32, m: u32, d: u32) -> ClassOccurrence {
        ClassOccurrence::from_template(
            template,
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            template.default_slot,
        )
    }

    #[test]
    fn test_valid_template() {
        assert_template_invariants(&make_template());
    }

    #[test]
    fn test_valid_occurrences() {
        let template = make_template();
        let occurrences = vec![on(&template, 2024, 1, 2), on(&template, 2024, 1, 9)];
        assert_generated_occurrences_invariants(&template, &occurrences);
    }

    #[test]
    #[should_panic(expected = "lists tuesday twice")]
    fn test_duplicate_day() {
        let mut template = make_template();
        template.recurring_days.push(Weekday::Tuesday);
        assert_template_invariants(&template);
    }

    #[test]
    #[should_panic(expected = "default slot ends before it starts")]
    fn test_reversed_default_slot() {
        let mut template = make_template();
        template.default_slot = TimeSlot::parse("18:00", "17:00").unwrap();
        assert_template_invariants(&template);
    }

    #[test]
    #[should_panic(expected = "not a recurring day")]
    fn test_occurrence_on_wrong_weekday() {
        let template = make_template();
        // 2024-01-03 is a Wednesday
        assert_generated_occurrences_invariants(&template, &[on(&template, 2024, 1, 3)]);
    }

    #[test]
    #[should_panic(expected = "outside the range")]
    fn test_occurrence_after_end_date() {
        let template = make_template();
        assert_generated_occurrences_invariants(&template, &[on(&template, 2024, 2, 6)]);
    }

    #[test]
    #[should_panic(expected = "generated")]
    fn test_repeated_date() {
        let template = make_template();
        let occurrences = vec![on(&template, 2024, 1, 9), on(&template, 2024, 1, 9)];
        assert_generated_occurrences_invariants(&template, &occurrences);
    }
}
