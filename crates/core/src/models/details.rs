//! Descriptive and booking-policy attributes shared by templates and occurrences

use serde::{Deserialize, Serialize};

/// Everything a bookable class carries besides its date and times
///
/// Templates own one of these; each occurrence holds its own copy taken at
/// materialization (or the last propagation), never a live view of the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDetails {
    pub title: String,
    pub description: Option<String>,
    pub instructor: String,
    pub class_type: String,
    pub difficulty_level: String,
    pub location: Option<String>,
    pub duration_minutes: u32,
    pub max_participants: u32,
    pub price_per_session: f64,
    pub credits_required: u32,
    pub equipment_needed: Vec<String>,
    pub prerequisites: Option<String>,
    pub class_goals: Option<String>,
    /// 1 (gentle) to 10 (maximal effort)
    pub intensity_level: Option<u8>,
    pub safety_requirements: Option<String>,
    pub age_restrictions: Option<String>,
    pub modifications_available: Option<String>,

    // Waitlist / booking policy
    pub waitlist_enabled: bool,
    pub waitlist_capacity: u32,
    pub auto_confirm_booking: bool,
    pub cancellation_deadline_hours: u32,
}

impl Default for ClassDetails {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            instructor: String::new(),
            class_type: "group".to_string(),
            difficulty_level: "all_levels".to_string(),
            location: None,
            duration_minutes: 60,
            max_participants: 20,
            price_per_session: 0.0,
            credits_required: 1,
            equipment_needed: Vec::new(),
            prerequisites: None,
            class_goals: None,
            intensity_level: None,
            safety_requirements: None,
            age_restrictions: None,
            modifications_available: None,
            waitlist_enabled: true,
            waitlist_capacity: 10,
            auto_confirm_booking: true,
            cancellation_deadline_hours: 24,
        }
    }
}

impl ClassDetails {
    pub fn new(title: String, instructor: String) -> Self {
        Self {
            title,
            instructor,
            ..Self::default()
        }
    }
}
