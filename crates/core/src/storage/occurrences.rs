//! Class occurrence storage operations

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, Row, ToSql};
use tracing::instrument;
use uuid::Uuid;

use super::columns::{assignment_list, column_list, placeholder_list, read_details, DetailParams};
use super::parse::{
    format_date, parse_date, parse_datetime, parse_time, parse_uuid, parse_uuid_opt, OptionalExt,
};
use crate::error::{Error, Result};
use crate::models::{format_time, BookingStatus, ClassOccurrence, TimeSlot};

/// Owned column values for the occurrence-only columns
struct OccurrenceParams<'a> {
    occurrence: &'a ClassOccurrence,
    id: String,
    date: String,
    start_time: String,
    end_time: String,
    parent_recurring_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl<'a> OccurrenceParams<'a> {
    fn new(occurrence: &'a ClassOccurrence) -> Self {
        Self {
            occurrence,
            id: occurrence.id.to_string(),
            date: format_date(occurrence.date),
            start_time: format_time(occurrence.slot.start_time),
            end_time: format_time(occurrence.slot.end_time),
            parent_recurring_id: occurrence.parent_recurring_id.map(|id| id.to_string()),
            created_at: occurrence.created_at.to_rfc3339(),
            updated_at: occurrence.updated_at.to_rfc3339(),
        }
    }

    fn named(&self) -> [(&'static str, &dyn ToSql); 9] {
        [
            (":id", &self.id),
            (":date", &self.date),
            (":start_time", &self.start_time),
            (":end_time", &self.end_time),
            (":current_participants", &self.occurrence.current_participants),
            (":parent_recurring_id", &self.parent_recurring_id),
            (":is_active", &self.occurrence.is_active),
            (":created_at", &self.created_at),
            (":updated_at", &self.updated_at),
        ]
    }
}

fn select_columns() -> String {
    format!(
        "id, {}, date, start_time, end_time, current_participants, parent_recurring_id,
         is_active, created_at, updated_at",
        column_list()
    )
}

fn occurrence_from_row(row: &Row<'_>) -> rusqlite::Result<ClassOccurrence> {
    Ok(ClassOccurrence {
        id: parse_uuid(&row.get::<_, String>("id")?)?,
        details: read_details(row)?,
        date: parse_date(&row.get::<_, String>("date")?)?,
        slot: TimeSlot::new(
            parse_time(&row.get::<_, String>("start_time")?)?,
            parse_time(&row.get::<_, String>("end_time")?)?,
        ),
        current_participants: row.get("current_participants")?,
        parent_recurring_id: parse_uuid_opt(row.get::<_, Option<String>>("parent_recurring_id")?)?,
        is_active: row.get("is_active")?,
        created_at: parse_datetime(&row.get::<_, String>("created_at")?)?,
        updated_at: parse_datetime(&row.get::<_, String>("updated_at")?)?,
    })
}

pub struct OccurrenceStore<'a> {
    conn: &'a Connection,
}

impl<'a> OccurrenceStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn insert_sql() -> String {
        format!(
            "INSERT INTO class_occurrences (id, {}, date, start_time, end_time,
                current_participants, parent_recurring_id, is_active, created_at, updated_at)
             VALUES (:id, {}, :date, :start_time, :end_time, :current_participants,
                :parent_recurring_id, :is_active, :created_at, :updated_at)",
            column_list(),
            placeholder_list(),
        )
    }

    /// Insert a single occurrence
    #[instrument(skip(self, occurrence), fields(occurrence_id = %occurrence.id, date = %occurrence.date))]
    pub fn create(&self, occurrence: &ClassOccurrence) -> Result<()> {
        self.create_many(std::slice::from_ref(occurrence))?;
        Ok(())
    }

    /// Insert many occurrences with one prepared statement.
    ///
    /// Not transactional on its own; callers wrap it.
    #[instrument(skip(self, occurrences), fields(count = occurrences.len()))]
    pub fn create_many(&self, occurrences: &[ClassOccurrence]) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(&Self::insert_sql())?;
        for occurrence in occurrences {
            let details = DetailParams::new(&occurrence.details)?;
            let own = OccurrenceParams::new(occurrence);
            let mut params: Vec<(&str, &dyn ToSql)> = details.named().to_vec();
            params.extend_from_slice(&own.named());
            stmt.execute(params.as_slice())?;
        }
        Ok(occurrences.len())
    }

    /// Find occurrence by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<ClassOccurrence>> {
        let sql = format!(
            "SELECT {} FROM class_occurrences WHERE id = ?1",
            select_columns()
        );
        let occurrence = self
            .conn
            .query_row(&sql, params![id.to_string()], occurrence_from_row)
            .optional()?;
        Ok(occurrence)
    }

    /// All occurrences generated from a template, by date
    #[instrument(skip(self))]
    pub fn list_for_template(&self, template_id: Uuid) -> Result<Vec<ClassOccurrence>> {
        let sql = format!(
            "SELECT {} FROM class_occurrences WHERE parent_recurring_id = ?1
             ORDER BY date, start_time",
            select_columns()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let occurrences = stmt
            .query_map(params![template_id.to_string()], occurrence_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(occurrences)
    }

    /// Occurrences of a template dated on or after `today`
    #[instrument(skip(self))]
    pub fn list_future_for_template(
        &self,
        template_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<ClassOccurrence>> {
        let sql = format!(
            "SELECT {} FROM class_occurrences WHERE parent_recurring_id = ?1 AND date >= ?2
             ORDER BY date, start_time",
            select_columns()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let occurrences = stmt
            .query_map(
                params![template_id.to_string(), format_date(today)],
                occurrence_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(occurrences)
    }

    /// Rewrite the copied class attributes, times and active flag.
    ///
    /// Date, parent and participant count are left alone.
    #[instrument(skip(self, occurrence), fields(occurrence_id = %occurrence.id))]
    pub fn update_snapshot(&self, occurrence: &ClassOccurrence) -> Result<bool> {
        let details = DetailParams::new(&occurrence.details)?;
        let own = OccurrenceParams::new(occurrence);

        let sql = format!(
            "UPDATE class_occurrences SET {}, start_time = :start_time, end_time = :end_time,
                is_active = :is_active, updated_at = :updated_at
             WHERE id = :id",
            assignment_list(),
        );

        let mut params: Vec<(&str, &dyn ToSql)> = details.named().to_vec();
        params.extend(own.named().into_iter().filter(|(name, _)| {
            matches!(
                *name,
                ":id" | ":start_time" | ":end_time" | ":is_active" | ":updated_at"
            )
        }));
        let rows = self.conn.execute(&sql, params.as_slice())?;
        Ok(rows > 0)
    }

    /// Set the active flag
    #[instrument(skip(self))]
    pub fn set_active(&self, id: Uuid, is_active: bool) -> Result<()> {
        self.conn.execute(
            "UPDATE class_occurrences SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
            params![is_active, Utc::now().to_rfc3339(), id.to_string()],
        )?;
        Ok(())
    }

    /// Delete a template's occurrences dated on or after `today`.
    ///
    /// Bookings referencing them must be removed first.
    #[instrument(skip(self))]
    pub fn delete_future_for_template(&self, template_id: Uuid, today: NaiveDate) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM class_occurrences WHERE parent_recurring_id = ?1 AND date >= ?2",
            params![template_id.to_string(), format_date(today)],
        )?;
        Ok(rows)
    }

    /// Recompute `current_participants` from confirmed bookings and return it
    #[instrument(skip(self))]
    pub fn reconcile_participants(&self, id: Uuid) -> Result<u32> {
        let rows = self.conn.execute(
            "UPDATE class_occurrences
             SET current_participants = (
                 SELECT COUNT(*) FROM bookings WHERE class_id = ?1 AND status = ?2
             )
             WHERE id = ?1",
            params![id.to_string(), BookingStatus::Confirmed.as_str()],
        )?;
        if rows == 0 {
            return Err(Error::NotFound(format!("class occurrence {id}")));
        }

        let count = self.conn.query_row(
            "SELECT current_participants FROM class_occurrences WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Reconcile every occurrence of a template; returns rows touched
    #[instrument(skip(self))]
    pub fn reconcile_for_template(&self, template_id: Uuid) -> Result<usize> {
        let rows = self.conn.execute(
            "UPDATE class_occurrences
             SET current_participants = (
                 SELECT COUNT(*) FROM bookings b
                 WHERE b.class_id = class_occurrences.id AND b.status = ?2
             )
             WHERE parent_recurring_id = ?1",
            params![template_id.to_string(), BookingStatus::Confirmed.as_str()],
        )?;
        Ok(rows)
    }
}
