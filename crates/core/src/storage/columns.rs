//! Column mapping for the class attributes shared by templates and occurrences

use rusqlite::{Row, ToSql};

use super::parse::parse_json;
use crate::error::Result;
use crate::models::ClassDetails;

/// Column names of [`ClassDetails`], identical in both tables
pub(super) const DETAIL_FIELDS: [&str; 21] = [
    "title",
    "description",
    "instructor",
    "class_type",
    "difficulty_level",
    "location",
    "duration_minutes",
    "max_participants",
    "price_per_session",
    "credits_required",
    "equipment_needed",
    "prerequisites",
    "class_goals",
    "intensity_level",
    "safety_requirements",
    "age_restrictions",
    "modifications_available",
    "waitlist_enabled",
    "waitlist_capacity",
    "auto_confirm_booking",
    "cancellation_deadline_hours",
];

/// `title, description, ...`
pub(super) fn column_list() -> String {
    DETAIL_FIELDS.join(", ")
}

/// `:title, :description, ...`
pub(super) fn placeholder_list() -> String {
    DETAIL_FIELDS
        .iter()
        .map(|field| format!(":{field}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `title = :title, description = :description, ...`
pub(super) fn assignment_list() -> String {
    DETAIL_FIELDS
        .iter()
        .map(|field| format!("{field} = :{field}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Bound parameter values for one [`ClassDetails`]
pub(super) struct DetailParams<'a> {
    details: &'a ClassDetails,
    equipment_json: String,
}

impl<'a> DetailParams<'a> {
    pub fn new(details: &'a ClassDetails) -> Result<Self> {
        Ok(Self {
            details,
            equipment_json: serde_json::to_string(&details.equipment_needed)?,
        })
    }

    pub fn named(&self) -> [(&'static str, &dyn ToSql); 21] {
        let d = self.details;
        [
            (":title", &d.title),
            (":description", &d.description),
            (":instructor", &d.instructor),
            (":class_type", &d.class_type),
            (":difficulty_level", &d.difficulty_level),
            (":location", &d.location),
            (":duration_minutes", &d.duration_minutes),
            (":max_participants", &d.max_participants),
            (":price_per_session", &d.price_per_session),
            (":credits_required", &d.credits_required),
            (":equipment_needed", &self.equipment_json),
            (":prerequisites", &d.prerequisites),
            (":class_goals", &d.class_goals),
            (":intensity_level", &d.intensity_level),
            (":safety_requirements", &d.safety_requirements),
            (":age_restrictions", &d.age_restrictions),
            (":modifications_available", &d.modifications_available),
            (":waitlist_enabled", &d.waitlist_enabled),
            (":waitlist_capacity", &d.waitlist_capacity),
            (":auto_confirm_booking", &d.auto_confirm_booking),
            (":cancellation_deadline_hours", &d.cancellation_deadline_hours),
        ]
    }
}

/// Read the detail columns of a row selected with [`column_list`]
pub(super) fn read_details(row: &Row<'_>) -> rusqlite::Result<ClassDetails> {
    Ok(ClassDetails {
        title: row.get("title")?,
        description: row.get("description")?,
        instructor: row.get("instructor")?,
        class_type: row.get("class_type")?,
        difficulty_level: row.get("difficulty_level")?,
        location: row.get("location")?,
        duration_minutes: row.get("duration_minutes")?,
        max_participants: row.get("max_participants")?,
        price_per_session: row.get("price_per_session")?,
        credits_required: row.get("credits_required")?,
        equipment_needed: parse_json(&row.get::<_, String>("equipment_needed")?)?,
        prerequisites: row.get("prerequisites")?,
        class_goals: row.get("class_goals")?,
        intensity_level: row.get("intensity_level")?,
        safety_requirements: row.get("safety_requirements")?,
        age_restrictions: row.get("age_restrictions")?,
        modifications_available: row.get("modifications_available")?,
        waitlist_enabled: row.get("waitlist_enabled")?,
        waitlist_capacity: row.get("waitlist_capacity")?,
        auto_confirm_booking: row.get("auto_confirm_booking")?,
        cancellation_deadline_hours: row.get("cancellation_deadline_hours")?,
    })
}
