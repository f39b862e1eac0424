//! Member storage operations
//!
//! `total_bookings` is shared with the booking subsystem. Every decrement goes
//! through [`MemberStore::decrement_bookings`], which floors at zero.

use rusqlite::{params, Connection};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::Member;

pub struct MemberStore<'a> {
    conn: &'a Connection,
}

impl<'a> MemberStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a member
    #[instrument(skip(self, member), fields(member_id = %member.id))]
    pub fn create(&self, member: &Member) -> Result<()> {
        self.conn.execute(
            "INSERT INTO members (id, name, email, total_bookings, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                member.id.to_string(),
                member.name,
                member.email,
                member.total_bookings,
                member.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find member by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Member>> {
        let member = self
            .conn
            .query_row(
                "SELECT id, name, email, total_bookings, created_at FROM members WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok(Member {
                        id: parse_uuid(&row.get::<_, String>(0)?)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        total_bookings: row.get(3)?,
                        created_at: parse_datetime(&row.get::<_, String>(4)?)?,
                    })
                },
            )
            .optional()?;
        Ok(member)
    }

    fn total_bookings(&self, id: Uuid) -> Result<u32> {
        self.conn
            .query_row(
                "SELECT total_bookings FROM members WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("member {id}")))
    }

    /// Add `count` to a member's booking counter; returns the new value
    #[instrument(skip(self))]
    pub fn increment_bookings(&self, id: Uuid, count: u32) -> Result<u32> {
        let current = self.total_bookings(id)?;
        let updated = current.saturating_add(count);
        self.conn.execute(
            "UPDATE members SET total_bookings = ?1 WHERE id = ?2",
            params![updated, id.to_string()],
        )?;
        Ok(updated)
    }

    /// Subtract `count` from a member's booking counter, never going below
    /// zero; returns the new value
    #[instrument(skip(self))]
    pub fn decrement_bookings(&self, id: Uuid, count: u32) -> Result<u32> {
        let current = self.total_bookings(id)?;
        if count > current {
            warn!(
                member_id = %id,
                current,
                requested = count,
                "Booking counter would go negative; clamping to zero"
            );
        }
        let updated = current.saturating_sub(count);
        self.conn.execute(
            "UPDATE members SET total_bookings = ?1 WHERE id = ?2",
            params![updated, id.to_string()],
        )?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn test_create_and_find() {
        let db = Database::open_in_memory().unwrap();
        let member = Member::new("Dana".to_string()).with_email("dana@example.com".to_string());
        db.members().create(&member).unwrap();

        let found = db.members().find_by_id(member.id).unwrap().unwrap();
        assert_eq!(found.name, "Dana");
        assert_eq!(found.email.as_deref(), Some("dana@example.com"));
        assert_eq!(found.total_bookings, 0);
    }

    #[test]
    fn test_counter_floors_at_zero() {
        let db = Database::open_in_memory().unwrap();
        let member = Member::new("Eli".to_string());
        db.members().create(&member).unwrap();
        let store = db.members();

        assert_eq!(store.increment_bookings(member.id, 3).unwrap(), 3);
        assert_eq!(store.decrement_bookings(member.id, 2).unwrap(), 1);
        assert_eq!(store.decrement_bookings(member.id, 5).unwrap(), 0);
        assert_eq!(store.find_by_id(member.id).unwrap().unwrap().total_bookings, 0);
    }

    #[test]
    fn test_unknown_member() {
        let db = Database::open_in_memory().unwrap();
        let err = db.members().decrement_bookings(Uuid::new_v4(), 1).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
