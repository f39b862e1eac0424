//! Template retirement

use chrono::NaiveDate;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{today, SeriesRetired, SeriesService};
use crate::error::{Error, Result};
use crate::storage::{BookingStore, MemberStore, OccurrenceStore, TemplateStore};

impl SeriesService<'_> {
    /// Delete a template. With `cascade`, also remove its occurrences dated
    /// today or later together with their bookings, adjusting member counters.
    pub fn delete_series(&self, template_id: Uuid, cascade: bool) -> Result<SeriesRetired> {
        self.delete_series_as_of(template_id, cascade, today())
    }

    /// Order inside the transaction: counters, bookings, occurrences, template.
    /// The counter adjustment reads the bookings that are deleted next.
    #[instrument(skip(self))]
    pub fn delete_series_as_of(
        &self,
        template_id: Uuid,
        cascade: bool,
        today: NaiveDate,
    ) -> Result<SeriesRetired> {
        let tx = self.conn.unchecked_transaction()?;
        let templates = TemplateStore::new(&tx);
        if !templates.exists(template_id)? {
            return Err(Error::NotFound(format!("recurring template {template_id}")));
        }

        let mut report = SeriesRetired {
            template_id,
            ..SeriesRetired::default()
        };

        if cascade {
            let bookings = BookingStore::new(&tx);
            let members = MemberStore::new(&tx);

            let counts = bookings.active_counts_for_future_series(template_id, today)?;
            for (member_id, count) in &counts {
                members.decrement_bookings(*member_id, *count)?;
            }
            report.members_adjusted = counts.len();
            report.bookings_removed = bookings.delete_for_future_series(template_id, today)?;
            report.occurrences_removed =
                OccurrenceStore::new(&tx).delete_future_for_template(template_id, today)?;
        }

        templates.delete(template_id)?;
        tx.commit()?;

        info!(
            %template_id,
            cascade,
            bookings_removed = report.bookings_removed,
            occurrences_removed = report.occurrences_removed,
            members_adjusted = report.members_adjusted,
            "Recurring template retired"
        );
        Ok(report)
    }
}
