//! Notification emitter: claim and notification write as one unit of work.
//!
//! # Invariants
//! - The ledger claim and the notification insert commit together or not at
//!   all. A failed insert never leaves a claimed-but-silent ledger entry.
//! - Losing the claim is a normal outcome, reported as `Ok(false)`.

use crate::model::notification::{task_action_url, Notification};
use crate::model::reminder::ReminderLedgerEntry;
use crate::reminder::evaluator::{ReminderMessage, ReminderPlan};
use crate::repo::ledger_repo::claim;
use crate::repo::notification_repo::insert_notification;
use crate::repo::task_repo::RepoResult;
use log::{debug, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use uuid::Uuid;

pub struct NotificationEmitter<'conn> {
    conn: &'conn Connection,
}

impl<'conn> NotificationEmitter<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Claims `plan.key` and writes the notification.
    ///
    /// Returns `true` when a notification was produced, `false` when another
    /// pass already holds the claim.
    ///
    /// # Errors
    /// - Storage failures from either write; the transaction is rolled back.
    pub fn emit(&self, plan: &ReminderPlan, now_ms: i64) -> RepoResult<bool> {
        // IMMEDIATE takes the write lock up front so racing passes queue on
        // the busy timeout instead of failing on lock upgrade.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let entry = ReminderLedgerEntry {
            key: plan.key.clone(),
            scheduled_for: plan.scheduled_for,
            sent_at: now_ms,
            channels: plan.channels.clone(),
        };
        if !claim(&tx, &entry)? {
            debug!(
                "event=claim_lost module=reminder status=skipped task_id={} user_id={} kind={} period={}",
                plan.key.task_id,
                plan.key.user_id,
                plan.kind(),
                plan.key.period.key()
            );
            return Ok(false);
        }

        let notification = render_notification(plan, now_ms);
        insert_notification(&tx, &notification)?;
        tx.commit()?;

        info!(
            "event=reminder_emitted module=reminder status=ok task_id={} user_id={} kind={} period={} notification_id={}",
            plan.key.task_id,
            plan.key.user_id,
            plan.kind(),
            plan.key.period.key(),
            notification.id
        );
        Ok(true)
    }
}

/// Builds the user-facing record for `plan`.
pub fn render_notification(plan: &ReminderPlan, now_ms: i64) -> Notification {
    let (title, message) = render_text(&plan.task.title, plan.message);
    Notification {
        id: Uuid::new_v4(),
        user_id: plan.key.user_id,
        kind: plan.kind().as_str().to_string(),
        title: title.to_string(),
        message,
        task_id: Some(plan.task.id),
        board_id: Some(plan.task.board_id),
        action_url: Some(task_action_url(plan.task.board_id, plan.task.id)),
        is_read: false,
        created_at: now_ms,
    }
}

fn render_text(task_title: &str, message: ReminderMessage) -> (&'static str, String) {
    match message {
        ReminderMessage::DueSoon { hours_until_due } => (
            "Task due soon",
            format!(
                "\"{task_title}\" is due in {hours_until_due} {}",
                plural(hours_until_due, "hour")
            ),
        ),
        ReminderMessage::Overdue { days_overdue: 0 } => {
            ("Task overdue", format!("\"{task_title}\" is now overdue"))
        }
        ReminderMessage::Overdue { days_overdue } => (
            "Task overdue",
            format!(
                "\"{task_title}\" is {days_overdue} {} overdue",
                plural(days_overdue, "day")
            ),
        ),
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}
