//! Notification preference repository.
//!
//! # Invariants
//! - A missing row is a normal state (`Ok(None)`), not an error.
//! - Upsert replaces the whole row; absent fields are stored as NULL.

use crate::model::preference::StoredPreferences;
use crate::model::task::UserId;
use crate::repo::task_repo::RepoResult;
use crate::repo::{bool_to_int, parse_optional_flag, parse_uuid};
use rusqlite::{params, Connection, Row};

const PREFERENCE_SELECT_SQL: &str = "SELECT
    user_id,
    in_app_enabled,
    email_enabled,
    push_enabled,
    in_app_due_soon,
    in_app_overdue,
    email_due_soon,
    email_overdue,
    push_due_soon,
    push_overdue,
    lead_time_minutes,
    quiet_hours_start,
    quiet_hours_end
FROM notification_preferences";

pub trait PreferenceRepository {
    fn get_preferences(&self, user_id: UserId) -> RepoResult<Option<StoredPreferences>>;
    fn upsert_preferences(&self, record: &StoredPreferences) -> RepoResult<()>;
}

pub struct SqlitePreferenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePreferenceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PreferenceRepository for SqlitePreferenceRepository<'_> {
    fn get_preferences(&self, user_id: UserId) -> RepoResult<Option<StoredPreferences>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PREFERENCE_SELECT_SQL} WHERE user_id = ?1;"))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_preference_row(row)?));
        }
        Ok(None)
    }

    fn upsert_preferences(&self, record: &StoredPreferences) -> RepoResult<()> {
        record.validate()?;

        self.conn.execute(
            "INSERT INTO notification_preferences (
                user_id,
                in_app_enabled,
                email_enabled,
                push_enabled,
                in_app_due_soon,
                in_app_overdue,
                email_due_soon,
                email_overdue,
                push_due_soon,
                push_overdue,
                lead_time_minutes,
                quiet_hours_start,
                quiet_hours_end
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(user_id) DO UPDATE SET
                in_app_enabled = excluded.in_app_enabled,
                email_enabled = excluded.email_enabled,
                push_enabled = excluded.push_enabled,
                in_app_due_soon = excluded.in_app_due_soon,
                in_app_overdue = excluded.in_app_overdue,
                email_due_soon = excluded.email_due_soon,
                email_overdue = excluded.email_overdue,
                push_due_soon = excluded.push_due_soon,
                push_overdue = excluded.push_overdue,
                lead_time_minutes = excluded.lead_time_minutes,
                quiet_hours_start = excluded.quiet_hours_start,
                quiet_hours_end = excluded.quiet_hours_end,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                record.user_id.to_string(),
                record.in_app_enabled.map(bool_to_int),
                record.email_enabled.map(bool_to_int),
                record.push_enabled.map(bool_to_int),
                record.in_app_due_soon.map(bool_to_int),
                record.in_app_overdue.map(bool_to_int),
                record.email_due_soon.map(bool_to_int),
                record.email_overdue.map(bool_to_int),
                record.push_due_soon.map(bool_to_int),
                record.push_overdue.map(bool_to_int),
                record.lead_time_minutes,
                record.quiet_hours_start.as_deref().map(str::trim),
                record.quiet_hours_end.as_deref().map(str::trim),
            ],
        )?;

        Ok(())
    }
}

fn parse_preference_row(row: &Row<'_>) -> RepoResult<StoredPreferences> {
    let user_id: String = row.get("user_id")?;
    let flag = |column: &str| -> RepoResult<Option<bool>> {
        parse_optional_flag(
            row.get(column)?,
            &format!("notification_preferences.{column}"),
        )
    };

    Ok(StoredPreferences {
        user_id: parse_uuid(&user_id, "notification_preferences.user_id")?,
        in_app_enabled: flag("in_app_enabled")?,
        email_enabled: flag("email_enabled")?,
        push_enabled: flag("push_enabled")?,
        in_app_due_soon: flag("in_app_due_soon")?,
        in_app_overdue: flag("in_app_overdue")?,
        email_due_soon: flag("email_due_soon")?,
        email_overdue: flag("email_overdue")?,
        push_due_soon: flag("push_due_soon")?,
        push_overdue: flag("push_overdue")?,
        lead_time_minutes: row.get("lead_time_minutes")?,
        quiet_hours_start: row.get("quiet_hours_start")?,
        quiet_hours_end: row.get("quiet_hours_end")?,
    })
}
