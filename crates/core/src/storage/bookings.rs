//! Booking storage operations
//!
//! Bookings belong to the booking subsystem; the scheduling core only reads
//! them for counts and removes them during cascade retirement.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{format_date, parse_booking_status, parse_datetime, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::{Booking, BookingStatus};

fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        user_id: parse_uuid(&row.get::<_, String>(1)?)?,
        class_id: parse_uuid(&row.get::<_, String>(2)?)?,
        status: parse_booking_status(&row.get::<_, String>(3)?)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?)?,
    })
}

pub struct BookingStore<'a> {
    conn: &'a Connection,
}

impl<'a> BookingStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a booking row
    #[instrument(skip(self, booking), fields(user_id = %booking.user_id, class_id = %booking.class_id, status = booking.status.as_str()))]
    pub fn create(&self, booking: &Booking) -> Result<()> {
        self.conn.execute(
            "INSERT INTO bookings (id, user_id, class_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                booking.id.to_string(),
                booking.user_id.to_string(),
                booking.class_id.to_string(),
                booking.status.as_str(),
                booking.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find booking by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let booking = self
            .conn
            .query_row(
                "SELECT id, user_id, class_id, status, created_at FROM bookings WHERE id = ?1",
                params![id.to_string()],
                booking_from_row,
            )
            .optional()?;
        Ok(booking)
    }

    /// Bookings against one class occurrence, oldest first
    #[instrument(skip(self))]
    pub fn list_for_class(&self, class_id: Uuid) -> Result<Vec<Booking>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, class_id, status, created_at FROM bookings
             WHERE class_id = ?1 ORDER BY created_at, rowid",
        )?;
        let bookings = stmt
            .query_map(params![class_id.to_string()], booking_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(bookings)
    }

    /// Change a booking's status
    #[instrument(skip(self))]
    pub fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<()> {
        self.conn.execute(
            "UPDATE bookings SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id.to_string()],
        )?;
        Ok(())
    }

    /// Confirmed bookings for one occurrence
    pub fn count_confirmed(&self, class_id: Uuid) -> Result<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE class_id = ?1 AND status = ?2",
            params![class_id.to_string(), BookingStatus::Confirmed.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Total booking rows
    pub fn count(&self) -> Result<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Non-cancelled bookings per user across a template's occurrences dated
    /// on or after `today`
    #[instrument(skip(self))]
    pub fn active_counts_for_future_series(
        &self,
        template_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<(Uuid, u32)>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.user_id, COUNT(*) FROM bookings b
             INNER JOIN class_occurrences c ON c.id = b.class_id
             WHERE c.parent_recurring_id = ?1 AND c.date >= ?2 AND b.status != ?3
             GROUP BY b.user_id
             ORDER BY b.user_id",
        )?;
        let counts = stmt
            .query_map(
                params![
                    template_id.to_string(),
                    format_date(today),
                    BookingStatus::Cancelled.as_str()
                ],
                |row| Ok((parse_uuid(&row.get::<_, String>(0)?)?, row.get(1)?)),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    /// Delete every booking (any status) on a template's occurrences dated on
    /// or after `today`
    #[instrument(skip(self))]
    pub fn delete_for_future_series(&self, template_id: Uuid, today: NaiveDate) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM bookings WHERE class_id IN (
                 SELECT id FROM class_occurrences WHERE parent_recurring_id = ?1 AND date >= ?2
             )",
            params![template_id.to_string(), format_date(today)],
        )?;
        Ok(rows)
    }
}
