//! Class occurrence - one concrete, bookable class on a single date

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ClassDetails, RecurringTemplate, TimeSlot, Weekday};

/// A bookable class row
///
/// Carries its own copy of the class attributes, so it stays bookable after
/// its template is edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassOccurrence {
    pub id: Uuid,
    #[serde(flatten)]
    pub details: ClassDetails,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub slot: TimeSlot,
    /// Cache of the confirmed booking count; see `OccurrenceStore::reconcile_participants`
    pub current_participants: u32,
    /// Owning template, if any. May dangle once the template is deleted.
    pub parent_recurring_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClassOccurrence {
    /// Snapshot a template onto a concrete date
    pub fn from_template(template: &RecurringTemplate, date: NaiveDate, slot: TimeSlot) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            details: template.details.clone(),
            date,
            slot,
            current_participants: 0,
            parent_recurring_id: Some(template.id),
            is_active: template.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    /// A one-off class with no parent series
    pub fn standalone(details: ClassDetails, date: NaiveDate, slot: TimeSlot) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            details,
            date,
            slot,
            current_participants: 0,
            parent_recurring_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday().into()
    }
}
