//! Occurrence materialization

use tracing::{info, instrument, warn};

use super::{SeriesCreated, SeriesService};
use crate::config::GenerationLimits;
use crate::error::{Error, Result};
use crate::invariants::{assert_generated_occurrences_invariants, assert_template_invariants};
use crate::models::{ClassOccurrence, RecurringTemplate, TemplateFields};
use crate::schedule::{expand_dates, weekday_of};
use crate::storage::{OccurrenceStore, TemplateStore};

/// Build (but do not persist) one occurrence per expanded date.
///
/// Fails with a validation error when no date survives.
pub fn plan_occurrences(
    template: &RecurringTemplate,
    limits: &GenerationLimits,
) -> Result<Vec<ClassOccurrence>> {
    let dates = expand_dates(
        template.start_date,
        template.end_date,
        &template.recurring_days,
        limits,
    );

    let occurrences: Vec<_> = dates
        .into_iter()
        .filter_map(|date| match template.slot_for(weekday_of(date)) {
            Some(slot) => Some(ClassOccurrence::from_template(template, date, slot)),
            None => {
                warn!(template_id = %template.id, %date, "Expanded date is not a recurring day; skipping");
                None
            }
        })
        .collect();

    if occurrences.is_empty() {
        return Err(Error::Validation("no valid dates generated".to_string()));
    }
    Ok(occurrences)
}

impl SeriesService<'_> {
    /// Create a template and all of its occurrences in one transaction
    #[instrument(skip_all)]
    pub fn create_series(&self, fields: TemplateFields) -> Result<SeriesCreated> {
        let template = RecurringTemplate::from_fields(fields)?;
        let occurrences = plan_occurrences(&template, &self.config.generation)?;

        assert_template_invariants(&template);
        assert_generated_occurrences_invariants(&template, &occurrences);

        let tx = self.conn.unchecked_transaction()?;
        TemplateStore::new(&tx).create(&template)?;
        let occurrence_count = OccurrenceStore::new(&tx).create_many(&occurrences)?;
        tx.commit()?;

        info!(
            template_id = %template.id,
            title = %template.details.title,
            occurrence_count,
            "Recurring series created"
        );

        Ok(SeriesCreated {
            template_id: template.id,
            occurrence_count,
            generated_dates: occurrences.iter().map(|o| o.date).collect(),
        })
    }
}
