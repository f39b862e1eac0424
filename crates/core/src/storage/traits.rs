//! Storage repository traits
//!
//! These traits define the engine surface the admin binary is written
//! against, so it can run over SQLite or a test double.

use uuid::Uuid;

use crate::error::Result;
use crate::models::{ClassOccurrence, DayChange, RecurringTemplate, TemplateFields};
use crate::series::{SeriesCreated, SeriesRetired, SeriesUpdate, UpdateOptions};

/// Recurring series operations
pub trait SeriesRepository {
    /// Validate, persist and materialize a new series
    fn create_series(&self, fields: TemplateFields) -> Result<SeriesCreated>;

    /// Replace a template's attributes, optionally propagating to future occurrences
    fn update_series(
        &self,
        template_id: Uuid,
        fields: TemplateFields,
        options: UpdateOptions,
    ) -> Result<SeriesUpdate>;

    /// Swap one recurring weekday for another
    fn change_weekday(
        &self,
        template_id: Uuid,
        change: DayChange,
        propagate: bool,
    ) -> Result<SeriesUpdate>;

    /// Delete a template, optionally cascading to its future occurrences
    fn delete_series(&self, template_id: Uuid, cascade: bool) -> Result<SeriesRetired>;

    /// Find template by ID
    fn find_series(&self, template_id: Uuid) -> Result<Option<RecurringTemplate>>;

    /// List templates, newest first
    fn list_series(&self) -> Result<Vec<RecurringTemplate>>;
}

/// Class occurrence operations
pub trait OccurrenceRepository {
    /// Find occurrence by ID
    fn find_occurrence(&self, occurrence_id: Uuid) -> Result<Option<ClassOccurrence>>;

    /// All occurrences generated from a template, by date
    fn list_occurrences_for_series(&self, template_id: Uuid) -> Result<Vec<ClassOccurrence>>;

    /// Recompute one occurrence's participant count from confirmed bookings
    fn reconcile_participants(&self, occurrence_id: Uuid) -> Result<u32>;

    /// Recompute participant counts for every occurrence of a template
    fn reconcile_series(&self, template_id: Uuid) -> Result<usize>;
}

/// Combined storage interface
pub trait Storage: SeriesRepository + OccurrenceRepository {}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where T: SeriesRepository + OccurrenceRepository {}
