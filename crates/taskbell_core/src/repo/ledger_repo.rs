//! Reminder ledger: the durable dedup store.
//!
//! # Responsibility
//! - Record that one logical reminder `(task, user, kind, period)` was
//!   emitted.
//! - Provide the atomic claim primitive every emission is gated by.
//!
//! # Invariants
//! - `try_claim` is a single unique-key insert: exactly one caller can win a
//!   key, no matter how many connections race for it.
//! - Entries are never updated or deleted here.

use crate::model::reminder::{
    decode_channels, encode_channels, LedgerKey, ReminderKind, ReminderLedgerEntry,
    ReminderPeriod,
};
use crate::model::task::TaskId;
use crate::repo::task_repo::{RepoError, RepoResult};
use crate::repo::parse_uuid;
use rusqlite::{params, Connection, Row};

pub trait ReminderLedger {
    /// Persists `entry` only if its key is new. Returns `true` when this call
    /// made the claim, `false` when the key already existed.
    fn try_claim(&self, entry: &ReminderLedgerEntry) -> RepoResult<bool>;
    /// Whether a claim for `key` already exists.
    fn has_claim(&self, key: &LedgerKey) -> RepoResult<bool>;
    /// All claims for one task, oldest first.
    fn list_for_task(&self, task_id: TaskId) -> RepoResult<Vec<ReminderLedgerEntry>>;
}

pub struct SqliteReminderLedger<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReminderLedger<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReminderLedger for SqliteReminderLedger<'_> {
    fn try_claim(&self, entry: &ReminderLedgerEntry) -> RepoResult<bool> {
        claim(self.conn, entry)
    }

    fn has_claim(&self, key: &LedgerKey) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM reminder_ledger
                WHERE task_uuid = ?1
                  AND user_id = ?2
                  AND kind = ?3
                  AND period_key = ?4
            );",
            params![
                key.task_id.to_string(),
                key.user_id.to_string(),
                key.kind.as_str(),
                key.period.key(),
            ],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_for_task(&self, task_id: TaskId) -> RepoResult<Vec<ReminderLedgerEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT task_uuid, user_id, kind, period_key, scheduled_for, sent_at, channels
             FROM reminder_ledger
             WHERE task_uuid = ?1
             ORDER BY sent_at ASC, user_id ASC, kind ASC, period_key ASC;",
        )?;
        let mut rows = stmt.query([task_id.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_ledger_row(row)?);
        }
        Ok(entries)
    }
}

/// Unique-key insert shared by [`SqliteReminderLedger::try_claim`] and the
/// emitter's transaction (a `Transaction` derefs to `Connection`).
pub(crate) fn claim(conn: &Connection, entry: &ReminderLedgerEntry) -> RepoResult<bool> {
    let inserted = conn.execute(
        "INSERT INTO reminder_ledger (
            task_uuid,
            user_id,
            kind,
            period_key,
            scheduled_for,
            sent_at,
            channels
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(task_uuid, user_id, kind, period_key) DO NOTHING;",
        params![
            entry.key.task_id.to_string(),
            entry.key.user_id.to_string(),
            entry.key.kind.as_str(),
            entry.key.period.key(),
            entry.scheduled_for,
            entry.sent_at,
            encode_channels(&entry.channels),
        ],
    )?;
    Ok(inserted == 1)
}

fn parse_ledger_row(row: &Row<'_>) -> RepoResult<ReminderLedgerEntry> {
    let task_uuid: String = row.get("task_uuid")?;
    let user_id: String = row.get("user_id")?;

    let kind_text: String = row.get("kind")?;
    let kind = ReminderKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid reminder kind `{kind_text}` in reminder_ledger.kind"
        ))
    })?;

    let period_text: String = row.get("period_key")?;
    let period = ReminderPeriod::parse_key(&period_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid period key `{period_text}` in reminder_ledger.period_key"
        ))
    })?;

    let channels_text: String = row.get("channels")?;
    let channels = decode_channels(&channels_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid channel list `{channels_text}` in reminder_ledger.channels"
        ))
    })?;

    Ok(ReminderLedgerEntry {
        key: LedgerKey {
            task_id: parse_uuid(&task_uuid, "reminder_ledger.task_uuid")?,
            user_id: parse_uuid(&user_id, "reminder_ledger.user_id")?,
            kind,
            period,
        },
        scheduled_for: row.get("scheduled_for")?,
        sent_at: row.get("sent_at")?,
        channels,
    })
}
