//! Recurring template storage operations

use rusqlite::{params, Connection, Row, ToSql};
use tracing::instrument;
use uuid::Uuid;

use super::columns::{assignment_list, column_list, placeholder_list, read_details, DetailParams};
use super::parse::{
    format_date, parse_date, parse_date_opt, parse_datetime, parse_json, parse_time, parse_uuid,
    OptionalExt,
};
use crate::error::Result;
use crate::models::{format_time, RecurringTemplate, TimeSlot};

/// Owned column values for the template-only columns
struct TemplateParams<'a> {
    template: &'a RecurringTemplate,
    id: String,
    recurring_days: String,
    daily_schedule: String,
    start_time: String,
    end_time: String,
    start_date: String,
    end_date: Option<String>,
    created_at: String,
    updated_at: String,
}

impl<'a> TemplateParams<'a> {
    fn new(template: &'a RecurringTemplate) -> Result<Self> {
        Ok(Self {
            template,
            id: template.id.to_string(),
            recurring_days: serde_json::to_string(&template.recurring_days)?,
            daily_schedule: serde_json::to_string(&template.daily_schedule)?,
            start_time: format_time(template.default_slot.start_time),
            end_time: format_time(template.default_slot.end_time),
            start_date: format_date(template.start_date),
            end_date: template.end_date.map(format_date),
            created_at: template.created_at.to_rfc3339(),
            updated_at: template.updated_at.to_rfc3339(),
        })
    }

    fn named(&self) -> [(&'static str, &dyn ToSql); 11] {
        [
            (":id", &self.id),
            (":recurring_days", &self.recurring_days),
            (":daily_schedule", &self.daily_schedule),
            (":start_time", &self.start_time),
            (":end_time", &self.end_time),
            (":start_date", &self.start_date),
            (":end_date", &self.end_date),
            (":is_active", &self.template.is_active),
            (":version", &self.template.version),
            (":created_at", &self.created_at),
            (":updated_at", &self.updated_at),
        ]
    }
}

fn select_columns() -> String {
    format!(
        "id, {}, recurring_days, daily_schedule, start_time, end_time, start_date, end_date,
         is_active, version, created_at, updated_at",
        column_list()
    )
}

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<RecurringTemplate> {
    Ok(RecurringTemplate {
        id: parse_uuid(&row.get::<_, String>("id")?)?,
        details: read_details(row)?,
        recurring_days: parse_json(&row.get::<_, String>("recurring_days")?)?,
        daily_schedule: parse_json(&row.get::<_, String>("daily_schedule")?)?,
        default_slot: TimeSlot::new(
            parse_time(&row.get::<_, String>("start_time")?)?,
            parse_time(&row.get::<_, String>("end_time")?)?,
        ),
        start_date: parse_date(&row.get::<_, String>("start_date")?)?,
        end_date: parse_date_opt(row.get::<_, Option<String>>("end_date")?)?,
        is_active: row.get("is_active")?,
        version: row.get("version")?,
        created_at: parse_datetime(&row.get::<_, String>("created_at")?)?,
        updated_at: parse_datetime(&row.get::<_, String>("updated_at")?)?,
    })
}

pub struct TemplateStore<'a> {
    conn: &'a Connection,
}

impl<'a> TemplateStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new template
    #[instrument(skip(self, template), fields(template_id = %template.id, title = %template.details.title))]
    pub fn create(&self, template: &RecurringTemplate) -> Result<()> {
        let details = DetailParams::new(&template.details)?;
        let own = TemplateParams::new(template)?;

        let sql = format!(
            "INSERT INTO recurring_templates (id, {}, recurring_days, daily_schedule, start_time,
                end_time, start_date, end_date, is_active, version, created_at, updated_at)
             VALUES (:id, {}, :recurring_days, :daily_schedule, :start_time, :end_time,
                :start_date, :end_date, :is_active, :version, :created_at, :updated_at)",
            column_list(),
            placeholder_list(),
        );

        let mut params: Vec<(&str, &dyn ToSql)> = details.named().to_vec();
        params.extend_from_slice(&own.named());
        self.conn.execute(&sql, params.as_slice())?;
        Ok(())
    }

    /// Find template by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<RecurringTemplate>> {
        let sql = format!(
            "SELECT {} FROM recurring_templates WHERE id = ?1",
            select_columns()
        );
        let template = self
            .conn
            .query_row(&sql, params![id.to_string()], template_from_row)
            .optional()?;
        Ok(template)
    }

    /// List all templates, most recently created first
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<RecurringTemplate>> {
        let sql = format!(
            "SELECT {} FROM recurring_templates ORDER BY created_at DESC, rowid DESC",
            select_columns()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let templates = stmt
            .query_map([], template_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(templates)
    }

    /// Overwrite every attribute of an existing template.
    ///
    /// `template.version` must already be the new version; the row is only
    /// written if the stored version is the one before it. Returns false when
    /// no row matched (missing, or changed concurrently).
    #[instrument(skip(self, template), fields(template_id = %template.id, version = template.version))]
    pub fn update(&self, template: &RecurringTemplate) -> Result<bool> {
        let details = DetailParams::new(&template.details)?;
        let own = TemplateParams::new(template)?;

        let sql = format!(
            "UPDATE recurring_templates SET {}, recurring_days = :recurring_days,
                daily_schedule = :daily_schedule, start_time = :start_time, end_time = :end_time,
                start_date = :start_date, end_date = :end_date, is_active = :is_active,
                version = :version, updated_at = :updated_at
             WHERE id = :id AND version = :previous_version",
            assignment_list(),
        );

        let previous_version = template.version - 1;
        let mut params: Vec<(&str, &dyn ToSql)> = details.named().to_vec();
        params.extend(
            own.named()
                .into_iter()
                .filter(|(name, _)| *name != ":created_at"),
        );
        params.push((":previous_version", &previous_version as &dyn ToSql));
        let rows = self.conn.execute(&sql, params.as_slice())?;
        Ok(rows > 0)
    }

    /// Delete a template row. Occurrences are not touched.
    #[instrument(skip(self))]
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM recurring_templates WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(rows > 0)
    }

    /// Check whether a template exists
    pub fn exists(&self, id: Uuid) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM recurring_templates WHERE id = ?1",
                params![id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassDetails, DailySchedule, TemplateFields, Weekday};
    use crate::storage::Database;
    use chrono::{NaiveDate, NaiveTime};

    fn make_template(title: &str) -> RecurringTemplate {
        let mut details = ClassDetails::new(title.to_string(), "Jo".to_string());
        details.equipment_needed = vec!["mat".to_string(), "band".to_string()];
        details.intensity_level = Some(6);
        RecurringTemplate::from_fields(TemplateFields {
            details,
            recurring_days: vec![Weekday::Tuesday, Weekday::Thursday],
            daily_schedule: DailySchedule::new()
                .with(Weekday::Thursday, TimeSlot::parse("18:00", "19:00").unwrap()),
            start_time: NaiveTime::from_hms_opt(9, 0, 0),
            end_time: NaiveTime::from_hms_opt(10, 0, 0),
            start_date: NaiveDate::from_ymd_opt(2024, 4, 2),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30),
            ..TemplateFields::default()
        })
        .unwrap()
    }

    #[test]
    fn test_create_and_find() {
        let db = Database::open_in_memory().unwrap();
        let store = db.templates();
        let template = make_template("Pilates");
        store.create(&template).unwrap();

        let found = store.find_by_id(template.id).unwrap().unwrap();
        assert_eq!(found.details, template.details);
        assert_eq!(found.recurring_days, template.recurring_days);
        assert_eq!(found.daily_schedule, template.daily_schedule);
        assert_eq!(found.default_slot, template.default_slot);
        assert_eq!(found.start_date, template.start_date);
        assert_eq!(found.end_date, template.end_date);
        assert_eq!(found.version, 1);

        assert!(store.find_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let store = db.templates();
        let first = make_template("First");
        let second = make_template("Second");
        store.create(&first).unwrap();
        store.create(&second).unwrap();

        let titles: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|t| t.details.title)
            .collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[test]
    fn test_update_requires_previous_version() {
        let db = Database::open_in_memory().unwrap();
        let store = db.templates();
        let mut template = make_template("Barre");
        store.create(&template).unwrap();

        template.details.location = Some("Studio B".to_string());
        template.version = 2;
        assert!(store.update(&template).unwrap());

        // Writing version 2 again finds stored version 2, not 1
        assert!(!store.update(&template).unwrap());

        let found = store.find_by_id(template.id).unwrap().unwrap();
        assert_eq!(found.details.location.as_deref(), Some("Studio B"));
        assert_eq!(found.version, 2);
    }

    #[test]
    fn test_delete() {
        let db = Database::open_in_memory().unwrap();
        let store = db.templates();
        let template = make_template("Boxing");
        store.create(&template).unwrap();

        assert!(store.exists(template.id).unwrap());
        assert!(store.delete(template.id).unwrap());
        assert!(!store.exists(template.id).unwrap());
        assert!(!store.delete(template.id).unwrap());
    }
}
