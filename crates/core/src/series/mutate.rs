//! Template edits and propagation to future occurrences

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{today, SeriesService, SeriesUpdate, UpdateOptions};
use crate::config::OrphanPolicy;
use crate::error::{Error, Result};
use crate::invariants::assert_template_invariants;
use crate::models::{ClassOccurrence, DayChange, RecurringTemplate, TemplateFields};
use crate::storage::{OccurrenceStore, TemplateStore};

/// Apply `policy` to a future occurrence the template no longer produces:
/// its weekday was dropped or its date left `[start_date, end_date]`.
/// Returns true when the occurrence changed and must be written back.
pub fn orphan_action(policy: OrphanPolicy, occurrence: &mut ClassOccurrence) -> bool {
    match policy {
        OrphanPolicy::LeaveUntouched => false,
        OrphanPolicy::Deactivate if occurrence.is_active => {
            occurrence.is_active = false;
            occurrence.updated_at = Utc::now();
            true
        }
        OrphanPolicy::Deactivate => false,
    }
}

/// Rewrite every occurrence of `template` dated on or after `today`.
/// Returns (propagated, orphaned).
fn propagate(
    conn: &Connection,
    template: &RecurringTemplate,
    today: NaiveDate,
    policy: OrphanPolicy,
) -> Result<(usize, usize)> {
    let store = OccurrenceStore::new(conn);
    let mut propagated = 0;
    let mut orphaned = 0;

    for mut occurrence in store.list_future_for_template(template.id, today)? {
        let slot = if template.covers(occurrence.date) {
            template.slot_for(occurrence.weekday())
        } else {
            None
        };
        match slot {
            Some(slot) => {
                occurrence.details = template.details.clone();
                occurrence.slot = slot;
                occurrence.updated_at = Utc::now();
                store.update_snapshot(&occurrence)?;
                propagated += 1;
            }
            None => {
                orphaned += 1;
                debug!(
                    occurrence_id = %occurrence.id,
                    date = %occurrence.date,
                    ?policy,
                    "Occurrence no longer produced by its template"
                );
                if orphan_action(policy, &mut occurrence) {
                    store.set_active(occurrence.id, occurrence.is_active)?;
                }
            }
        }
    }

    Ok((propagated, orphaned))
}

fn load_template(store: &TemplateStore<'_>, template_id: Uuid) -> Result<RecurringTemplate> {
    store
        .find_by_id(template_id)?
        .ok_or_else(|| Error::NotFound(format!("recurring template {template_id}")))
}

impl SeriesService<'_> {
    /// Replace a template's attributes; see [`UpdateOptions`]
    pub fn update_series(
        &self,
        template_id: Uuid,
        fields: TemplateFields,
        options: UpdateOptions,
    ) -> Result<SeriesUpdate> {
        self.update_series_as_of(template_id, fields, options, today())
    }

    #[instrument(skip_all, fields(template_id = %template_id, propagate = options.propagate))]
    pub fn update_series_as_of(
        &self,
        template_id: Uuid,
        fields: TemplateFields,
        options: UpdateOptions,
        today: NaiveDate,
    ) -> Result<SeriesUpdate> {
        let tx = self.conn.unchecked_transaction()?;
        let templates = TemplateStore::new(&tx);
        let mut template = load_template(&templates, template_id)?;

        if let Some(expected) = options.expected_version {
            if expected != template.version {
                return Err(Error::Conflict(format!(
                    "recurring template {template_id} is at version {}, expected {expected}",
                    template.version
                )));
            }
        }

        template.replace_fields(fields)?;
        if let Some(change) = &options.day_change {
            template.apply_day_change(change)?;
        }

        let update = self.write_and_propagate(&tx, template, options.propagate, today)?;
        tx.commit()?;
        Ok(update)
    }

    /// Swap one recurring weekday for another; all or nothing
    pub fn change_weekday(
        &self,
        template_id: Uuid,
        change: DayChange,
        propagate: bool,
    ) -> Result<SeriesUpdate> {
        self.change_weekday_as_of(template_id, change, propagate, today())
    }

    #[instrument(skip(self, change), fields(old = %change.old, new = %change.new))]
    pub fn change_weekday_as_of(
        &self,
        template_id: Uuid,
        change: DayChange,
        propagate: bool,
        today: NaiveDate,
    ) -> Result<SeriesUpdate> {
        let tx = self.conn.unchecked_transaction()?;
        let mut template = load_template(&TemplateStore::new(&tx), template_id)?;
        template.apply_day_change(&change)?;

        let update = self.write_and_propagate(&tx, template, propagate, today)?;
        tx.commit()?;
        Ok(update)
    }

    fn write_and_propagate(
        &self,
        conn: &Connection,
        mut template: RecurringTemplate,
        propagate_changes: bool,
        today: NaiveDate,
    ) -> Result<SeriesUpdate> {
        template.mark_updated();
        assert_template_invariants(&template);

        if !TemplateStore::new(conn).update(&template)? {
            return Err(Error::Conflict(format!(
                "recurring template {} changed concurrently",
                template.id
            )));
        }

        let (propagated, orphaned) = if propagate_changes {
            propagate(conn, &template, today, self.config.propagation.orphan_policy)?
        } else {
            (0, 0)
        };

        info!(
            template_id = %template.id,
            version = template.version,
            propagated,
            orphaned,
            "Recurring template updated"
        );

        Ok(SeriesUpdate {
            template,
            propagated,
            orphaned,
        })
    }
}
