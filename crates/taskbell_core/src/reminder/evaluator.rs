//! Reminder evaluator: decides whether a candidate fires now.
//!
//! Check order for both kinds: policy switch, eligibility, ledger, quiet
//! hours. A skip never writes to the ledger, so a candidate held back by
//! quiet hours stays eligible for later passes while its window is open.
//!
//! # Invariants
//! - Due-soon is eligible iff `due - lead <= now < due`; its ledger period
//!   is the observed due timestamp, so editing the due date re-arms it.
//! - Overdue is eligible once per local calendar day; its ledger period is
//!   that day.

use crate::clock::local_day_start;
use crate::model::preference::NotificationPolicy;
use crate::model::reminder::{Channel, LedgerKey, ReminderKind, ReminderPeriod};
use crate::model::task::Task;
use crate::reminder::quiet_hours::is_suppressed;
use crate::reminder::scanner::Candidate;
use crate::repo::ledger_repo::ReminderLedger;
use crate::repo::task_repo::RepoResult;
use chrono::{DateTime, FixedOffset, TimeDelta};

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The user's in-app switch for this kind is off.
    DisabledByPolicy,
    /// Not inside the eligibility window at this instant.
    OutsideWindow,
    /// The ledger already holds this key.
    AlreadySent,
    /// Deferred by quiet hours; retried on a later pass.
    QuietHours,
}

/// Parameters rendered into the notification text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderMessage {
    DueSoon { hours_until_due: i64 },
    Overdue { days_overdue: i64 },
}

/// Everything the emitter needs to claim and write one reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderPlan {
    pub task: Task,
    pub key: LedgerKey,
    pub scheduled_for: i64,
    pub channels: Vec<Channel>,
    pub message: ReminderMessage,
}

impl ReminderPlan {
    pub fn kind(&self) -> ReminderKind {
        self.key.kind
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Emit(ReminderPlan),
    Skip(SkipReason),
}

/// `due - lead <= now < due`.
pub fn due_soon_window_contains(due_at: i64, lead_time: TimeDelta, now_ms: i64) -> bool {
    let window_start = due_at.saturating_sub(lead_time.num_milliseconds());
    now_ms >= window_start && now_ms < due_at
}

/// Whole hours left, rounded up, never below one.
pub fn hours_until_due(due_at: i64, now_ms: i64) -> i64 {
    let remaining = due_at.saturating_sub(now_ms).max(0);
    ((remaining + HOUR_MS - 1) / HOUR_MS).max(1)
}

/// `floor((now - due) / 1 day)`, zero when not yet due.
pub fn days_overdue(due_at: i64, now_ms: i64) -> i64 {
    now_ms.saturating_sub(due_at).max(0) / DAY_MS
}

pub struct ReminderEvaluator<'l, L: ReminderLedger> {
    ledger: &'l L,
}

impl<'l, L: ReminderLedger> ReminderEvaluator<'l, L> {
    pub fn new(ledger: &'l L) -> Self {
        Self { ledger }
    }

    pub fn evaluate(
        &self,
        kind: ReminderKind,
        candidate: &Candidate,
        policy: &NotificationPolicy,
        now: DateTime<FixedOffset>,
    ) -> RepoResult<Decision> {
        match kind {
            ReminderKind::DueSoon => self.evaluate_due_soon(candidate, policy, now),
            ReminderKind::Overdue => self.evaluate_overdue(candidate, policy, now),
        }
    }

    pub fn evaluate_due_soon(
        &self,
        candidate: &Candidate,
        policy: &NotificationPolicy,
        now: DateTime<FixedOffset>,
    ) -> RepoResult<Decision> {
        let kind = ReminderKind::DueSoon;
        if !policy.generates(kind) {
            return Ok(Decision::Skip(SkipReason::DisabledByPolicy));
        }

        let now_ms = now.timestamp_millis();
        if !due_soon_window_contains(candidate.due_at, policy.lead_time, now_ms) {
            return Ok(Decision::Skip(SkipReason::OutsideWindow));
        }

        let key = LedgerKey {
            task_id: candidate.task.id,
            user_id: candidate.user_id,
            kind,
            period: ReminderPeriod::DueAt(candidate.due_at),
        };
        if let Some(skip) = self.gate(&key, policy, now)? {
            return Ok(Decision::Skip(skip));
        }

        Ok(Decision::Emit(ReminderPlan {
            task: candidate.task.clone(),
            key,
            scheduled_for: candidate
                .due_at
                .saturating_sub(policy.lead_time.num_milliseconds()),
            channels: policy.channels_for(kind),
            message: ReminderMessage::DueSoon {
                hours_until_due: hours_until_due(candidate.due_at, now_ms),
            },
        }))
    }

    pub fn evaluate_overdue(
        &self,
        candidate: &Candidate,
        policy: &NotificationPolicy,
        now: DateTime<FixedOffset>,
    ) -> RepoResult<Decision> {
        let kind = ReminderKind::Overdue;
        if !policy.generates(kind) {
            return Ok(Decision::Skip(SkipReason::DisabledByPolicy));
        }

        let now_ms = now.timestamp_millis();
        if now_ms < candidate.due_at {
            return Ok(Decision::Skip(SkipReason::OutsideWindow));
        }

        let key = LedgerKey {
            task_id: candidate.task.id,
            user_id: candidate.user_id,
            kind,
            period: ReminderPeriod::Day(now.date_naive()),
        };
        if let Some(skip) = self.gate(&key, policy, now)? {
            return Ok(Decision::Skip(skip));
        }

        let day_start_ms = local_day_start(now).timestamp_millis();
        Ok(Decision::Emit(ReminderPlan {
            task: candidate.task.clone(),
            key,
            scheduled_for: candidate.due_at.max(day_start_ms),
            channels: policy.channels_for(kind),
            message: ReminderMessage::Overdue {
                days_overdue: days_overdue(candidate.due_at, now_ms),
            },
        }))
    }

    /// Ledger first, then quiet hours.
    fn gate(
        &self,
        key: &LedgerKey,
        policy: &NotificationPolicy,
        now: DateTime<FixedOffset>,
    ) -> RepoResult<Option<SkipReason>> {
        if self.ledger.has_claim(key)? {
            return Ok(Some(SkipReason::AlreadySent));
        }
        if is_suppressed(policy, now) {
            return Ok(Some(SkipReason::QuietHours));
        }
        Ok(None)
    }
}
