//! Notification store reads and the insert used by the emitter.

use crate::model::notification::Notification;
use crate::model::task::{TaskId, UserId};
use crate::repo::task_repo::RepoResult;
use crate::repo::{bool_to_int, parse_flag, parse_optional_uuid, parse_uuid};
use rusqlite::{params, Connection, Row};

const NOTIFICATIONS_DEFAULT_LIMIT: u32 = 20;
const NOTIFICATIONS_LIMIT_MAX: u32 = 100;

pub trait NotificationRepository {
    /// Newest first: `created_at DESC, uuid ASC`.
    fn list_for_user(&self, user_id: UserId, limit: Option<u32>) -> RepoResult<Vec<Notification>>;
    fn count_for_task(&self, task_id: TaskId, kind: &str) -> RepoResult<u32>;
}

pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn list_for_user(&self, user_id: UserId, limit: Option<u32>) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, user_id, kind, title, message, task_uuid, board_uuid, action_url, is_read, created_at
             FROM notifications
             WHERE user_id = ?1
             ORDER BY created_at DESC, uuid ASC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![
            user_id.to_string(),
            i64::from(normalize_notification_limit(limit)),
        ])?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }

    fn count_for_task(&self, task_id: TaskId, kind: &str) -> RepoResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE task_uuid = ?1 AND kind = ?2;",
            params![task_id.to_string(), kind],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Normalizes list limit: `None`/`0` use the default, large values clamp.
pub fn normalize_notification_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => NOTIFICATIONS_DEFAULT_LIMIT,
        Some(value) if value > NOTIFICATIONS_LIMIT_MAX => NOTIFICATIONS_LIMIT_MAX,
        Some(value) => value,
    }
}

pub(crate) fn insert_notification(conn: &Connection, notification: &Notification) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO notifications (
            uuid,
            user_id,
            kind,
            title,
            message,
            task_uuid,
            board_uuid,
            action_url,
            is_read,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
        params![
            notification.id.to_string(),
            notification.user_id.to_string(),
            notification.kind.as_str(),
            notification.title.as_str(),
            notification.message.as_str(),
            notification.task_id.map(|id| id.to_string()),
            notification.board_id.map(|id| id.to_string()),
            notification.action_url.as_deref(),
            bool_to_int(notification.is_read),
            notification.created_at,
        ],
    )?;
    Ok(())
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let uuid: String = row.get("uuid")?;
    let user_id: String = row.get("user_id")?;

    Ok(Notification {
        id: parse_uuid(&uuid, "notifications.uuid")?,
        user_id: parse_uuid(&user_id, "notifications.user_id")?,
        kind: row.get("kind")?,
        title: row.get("title")?,
        message: row.get("message")?,
        task_id: parse_optional_uuid(row.get("task_uuid")?, "notifications.task_uuid")?,
        board_id: parse_optional_uuid(row.get("board_uuid")?, "notifications.board_uuid")?,
        action_url: row.get("action_url")?,
        is_read: parse_flag(row.get("is_read")?, "notifications.is_read")?,
        created_at: row.get("created_at")?,
    })
}
