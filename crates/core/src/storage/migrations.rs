//! Database migration system
//!
//! Tracks schema versions and applies migrations in order. Each migration
//! and its `schema_migrations` record commit together.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Recurring series definitions
            CREATE TABLE IF NOT EXISTS recurring_templates (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                instructor TEXT NOT NULL,
                class_type TEXT NOT NULL,
                difficulty_level TEXT NOT NULL,
                location TEXT,
                duration_minutes INTEGER NOT NULL,
                max_participants INTEGER NOT NULL,
                price_per_session REAL NOT NULL DEFAULT 0,
                credits_required INTEGER NOT NULL DEFAULT 1,
                -- JSON array of strings
                equipment_needed TEXT NOT NULL DEFAULT '[]',
                prerequisites TEXT,
                class_goals TEXT,
                intensity_level INTEGER,
                safety_requirements TEXT,
                age_restrictions TEXT,
                modifications_available TEXT,
                waitlist_enabled INTEGER NOT NULL DEFAULT 1,
                waitlist_capacity INTEGER NOT NULL DEFAULT 0,
                auto_confirm_booking INTEGER NOT NULL DEFAULT 1,
                cancellation_deadline_hours INTEGER NOT NULL DEFAULT 24,
                -- JSON array of lowercase weekday names
                recurring_days TEXT NOT NULL,
                -- JSON object: weekday -> {start_time, end_time}
                daily_schedule TEXT NOT NULL DEFAULT '{}',
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                version INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Concrete bookable classes
            -- parent_recurring_id has no foreign key; it may dangle after a
            -- non-cascade template delete
            CREATE TABLE IF NOT EXISTS class_occurrences (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                instructor TEXT NOT NULL,
                class_type TEXT NOT NULL,
                difficulty_level TEXT NOT NULL,
                location TEXT,
                duration_minutes INTEGER NOT NULL,
                max_participants INTEGER NOT NULL,
                price_per_session REAL NOT NULL DEFAULT 0,
                credits_required INTEGER NOT NULL DEFAULT 1,
                equipment_needed TEXT NOT NULL DEFAULT '[]',
                prerequisites TEXT,
                class_goals TEXT,
                intensity_level INTEGER,
                safety_requirements TEXT,
                age_restrictions TEXT,
                modifications_available TEXT,
                waitlist_enabled INTEGER NOT NULL DEFAULT 1,
                waitlist_capacity INTEGER NOT NULL DEFAULT 0,
                auto_confirm_booking INTEGER NOT NULL DEFAULT 1,
                cancellation_deadline_hours INTEGER NOT NULL DEFAULT 24,
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                current_participants INTEGER NOT NULL DEFAULT 0,
                parent_recurring_id TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Members (owned by the booking subsystem)
            CREATE TABLE IF NOT EXISTS members (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                total_bookings INTEGER NOT NULL DEFAULT 0 CHECK (total_bookings >= 0),
                created_at TEXT NOT NULL
            );

            -- Bookings (owned by the booking subsystem)
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                class_id TEXT NOT NULL,
                -- confirmed, waitlist, cancelled
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES members(id) ON DELETE CASCADE,
                FOREIGN KEY (class_id) REFERENCES class_occurrences(id)
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for series and booking lookups",
        sql: r#"
            -- Future-occurrence queries filter on (parent, date)
            CREATE INDEX IF NOT EXISTS idx_occurrences_parent_date
                ON class_occurrences(parent_recurring_id, date);
            CREATE INDEX IF NOT EXISTS idx_occurrences_date ON class_occurrences(date);

            CREATE INDEX IF NOT EXISTS idx_templates_created ON recurring_templates(created_at);

            CREATE INDEX IF NOT EXISTS idx_bookings_class ON bookings(class_id);
            CREATE INDEX IF NOT EXISTS idx_bookings_user ON bookings(user_id);
            CREATE INDEX IF NOT EXISTS idx_bookings_class_status ON bookings(class_id, status);
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
pub(super) fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;
    info!(current_version, "Checking for pending migrations");

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(migration.sql)?;
            record_migration(&tx, migration)?;
            tx.commit()?;

            info!(version = migration.version, "Migration complete");
        }
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Get the latest migration version (test helper)
    fn latest_version() -> u32 {
        MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
    }

    #[test]
    fn test_migrations_run() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Run twice
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_occurrence_parent_is_not_a_foreign_key() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON").unwrap();
        run_migrations(&conn).unwrap();

        // A dangling parent reference must be accepted
        conn.execute(
            "INSERT INTO class_occurrences (id, title, instructor, class_type, difficulty_level,
                duration_minutes, max_participants, date, start_time, end_time,
                parent_recurring_id, created_at, updated_at)
             VALUES ('occ', 'Yoga', 'Kim', 'group', 'all_levels', 60, 10, '2024-01-01',
                '07:00', '08:00', 'no-such-template', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_member_counter_cannot_go_negative() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO members (id, name, total_bookings, created_at)
             VALUES ('m', 'Pat', -1, '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_migrations_sequential() {
        // Verify migrations are numbered sequentially
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(
                migration.version as usize,
                i + 1,
                "Migration {} should have version {}",
                migration.description,
                i + 1
            );
        }
    }
}
