//! SQLite storage layer for GymFlow

mod bookings;
mod columns;
mod members;
mod migrations;
mod occurrences;
mod parse;
mod templates;
mod traits;

use rusqlite::Connection;
use std::path::Path;
use tracing::instrument;
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::error::Result;
use crate::models::{ClassOccurrence, DayChange, RecurringTemplate, TemplateFields};
use crate::series::{SeriesCreated, SeriesRetired, SeriesService, SeriesUpdate, UpdateOptions};

pub use bookings::BookingStore;
pub use members::MemberStore;
pub use occurrences::OccurrenceStore;
pub use templates::TemplateStore;
pub use traits::{OccurrenceRepository, SeriesRepository, Storage};

/// Main database handle
pub struct Database {
    conn: Connection,
    config: SchedulingConfig,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self {
            conn,
            config: SchedulingConfig::default(),
        };
        db.init()?;
        Ok(db)
    }

    /// Replace the scheduling configuration
    pub fn with_config(mut self, config: SchedulingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    pub fn templates(&self) -> TemplateStore<'_> {
        TemplateStore::new(&self.conn)
    }

    pub fn occurrences(&self) -> OccurrenceStore<'_> {
        OccurrenceStore::new(&self.conn)
    }

    pub fn bookings(&self) -> BookingStore<'_> {
        BookingStore::new(&self.conn)
    }

    pub fn members(&self) -> MemberStore<'_> {
        MemberStore::new(&self.conn)
    }

    /// Raw connection, for tests that install triggers or inspect rows
    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Series engine bound to this connection and configuration
    pub fn series(&self) -> SeriesService<'_> {
        SeriesService::new(&self.conn, &self.config)
    }
}

// Repository traits for Database

impl SeriesRepository for Database {
    fn create_series(&self, fields: TemplateFields) -> Result<SeriesCreated> {
        self.series().create_series(fields)
    }

    fn update_series(
        &self,
        template_id: Uuid,
        fields: TemplateFields,
        options: UpdateOptions,
    ) -> Result<SeriesUpdate> {
        self.series().update_series(template_id, fields, options)
    }

    fn change_weekday(
        &self,
        template_id: Uuid,
        change: DayChange,
        propagate: bool,
    ) -> Result<SeriesUpdate> {
        self.series().change_weekday(template_id, change, propagate)
    }

    fn delete_series(&self, template_id: Uuid, cascade: bool) -> Result<SeriesRetired> {
        self.series().delete_series(template_id, cascade)
    }

    fn find_series(&self, template_id: Uuid) -> Result<Option<RecurringTemplate>> {
        self.templates().find_by_id(template_id)
    }

    fn list_series(&self) -> Result<Vec<RecurringTemplate>> {
        self.templates().list()
    }
}

impl OccurrenceRepository for Database {
    fn find_occurrence(&self, occurrence_id: Uuid) -> Result<Option<ClassOccurrence>> {
        self.occurrences().find_by_id(occurrence_id)
    }

    fn list_occurrences_for_series(&self, template_id: Uuid) -> Result<Vec<ClassOccurrence>> {
        self.occurrences().list_for_template(template_id)
    }

    fn reconcile_participants(&self, occurrence_id: Uuid) -> Result<u32> {
        self.occurrences().reconcile_participants(occurrence_id)
    }

    fn reconcile_series(&self, template_id: Uuid) -> Result<usize> {
        self.occurrences().reconcile_for_template(template_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrphanPolicy;
    use tempfile::TempDir;

    #[test]
    fn test_open_file_runs_migrations_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gymflow.db");

        let db = Database::open(&path).unwrap();
        let version = db.schema_version();
        assert!(version >= 1);
        drop(db);

        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.schema_version(), version);
    }

    #[test]
    fn test_with_config() {
        let mut config = SchedulingConfig::default();
        config.propagation.orphan_policy = OrphanPolicy::Deactivate;
        let db = Database::open_in_memory().unwrap().with_config(config.clone());
        assert_eq!(db.config(), &config);
    }
}
