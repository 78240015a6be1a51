//! Scan driver: one full reminder pass.
//!
//! # Responsibility
//! - Wire scanner, policy resolver, evaluator and emitter over one
//!   connection and aggregate the outcome into a [`PassSummary`].
//!
//! # Invariants
//! - A pass always returns a summary. Per-candidate failures are collected
//!   as [`PassError`] entries and never abort the remaining candidates.
//! - Re-running a pass with no state change adds nothing to the ledger.

use crate::model::reminder::ReminderKind;
use crate::model::task::{TaskId, UserId};
use crate::reminder::emitter::NotificationEmitter;
use crate::reminder::evaluator::{Decision, ReminderEvaluator, SkipReason};
use crate::reminder::policy::PolicyResolver;
use crate::reminder::scanner::{Candidate, CandidateScanner};
use crate::reminder::EngineSettings;
use crate::repo::ledger_repo::{ReminderLedger, SqliteReminderLedger};
use crate::repo::preference_repo::{PreferenceRepository, SqlitePreferenceRepository};
use crate::repo::task_repo::{RepoResult, SqliteTaskRepository};
use chrono::{DateTime, FixedOffset};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use serde::Serialize;

/// One isolated failure inside a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub message: String,
}

/// Machine-readable pass outcome returned to the trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    /// Epoch ms of the pass instant.
    pub ran_at: i64,
    /// (task, user, kind) triples evaluated.
    pub candidates: u32,
    pub due_soon_sent: u32,
    pub overdue_sent: u32,
    pub already_sent: u32,
    pub quiet_hours_deferred: u32,
    pub disabled_by_policy: u32,
    pub outside_window: u32,
    /// Claims taken by a concurrent pass between evaluation and emission.
    pub lost_race: u32,
    pub errors: Vec<PassError>,
    pub error_count: u32,
}

impl PassSummary {
    fn new(ran_at: i64) -> Self {
        Self {
            ran_at,
            ..Self::default()
        }
    }

    /// Total notifications produced by this pass.
    pub fn sent(&self) -> u32 {
        self.due_soon_sent + self.overdue_sent
    }

    fn record_error(&mut self, task_id: Option<TaskId>, user_id: Option<UserId>, message: String) {
        self.errors.push(PassError {
            task_id,
            user_id,
            message,
        });
        self.error_count = self.errors.len() as u32;
    }

    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::DisabledByPolicy => self.disabled_by_policy += 1,
            SkipReason::OutsideWindow => self.outside_window += 1,
            SkipReason::AlreadySent => self.already_sent += 1,
            SkipReason::QuietHours => self.quiet_hours_deferred += 1,
        }
    }

    fn record_sent(&mut self, kind: ReminderKind) {
        match kind {
            ReminderKind::DueSoon => self.due_soon_sent += 1,
            ReminderKind::Overdue => self.overdue_sent += 1,
        }
    }
}

/// Runs reminder passes against one SQLite connection.
///
/// Overlapping passes should each use their own connection to the same
/// database file; the ledger claim serializes them.
pub struct ScanDriver<'conn> {
    conn: &'conn Connection,
    settings: EngineSettings,
}

impl<'conn> ScanDriver<'conn> {
    pub fn new(conn: &'conn Connection, settings: EngineSettings) -> Self {
        Self { conn, settings }
    }

    /// Runs one pass at `now` and returns its summary.
    pub fn run_pass(&self, now: DateTime<FixedOffset>) -> PassSummary {
        let now_ms = now.timestamp_millis();
        let mut summary = PassSummary::new(now_ms);
        info!("event=pass_start module=reminder status=ok ran_at={now_ms}");

        let tasks = SqliteTaskRepository::new(self.conn);
        let scanner = CandidateScanner::new(&tasks, self.settings.max_lead_time);
        let candidates = match scanner.scan(now) {
            Ok(candidates) => candidates,
            Err(err) => {
                error!("event=pass_scan module=reminder status=error error={err}");
                summary.record_error(None, None, format!("candidate scan failed: {err}"));
                log_finish(&summary);
                return summary;
            }
        };

        debug!(
            "event=pass_scan module=reminder status=ok candidates={} unresolved={}",
            candidates.len(),
            candidates.unresolved.len()
        );
        for task_id in &candidates.unresolved {
            summary.record_error(
                Some(*task_id),
                None,
                "task has neither an assignee nor a board owner".to_string(),
            );
        }

        let preferences = SqlitePreferenceRepository::new(self.conn);
        let mut resolver = PolicyResolver::new(&preferences, self.settings.max_lead_time);
        let ledger = SqliteReminderLedger::new(self.conn);
        let evaluator = ReminderEvaluator::new(&ledger);
        let emitter = NotificationEmitter::new(self.conn);

        let batches = [
            (ReminderKind::DueSoon, &candidates.due_soon),
            (ReminderKind::Overdue, &candidates.overdue),
        ];
        for (kind, batch) in batches {
            for candidate in batch {
                summary.candidates += 1;
                let outcome = process_candidate(
                    kind,
                    candidate,
                    now,
                    &mut resolver,
                    &evaluator,
                    &emitter,
                    &mut summary,
                );
                if let Err(err) = outcome {
                    warn!(
                        "event=candidate_failed module=reminder status=error task_id={} user_id={} kind={} error={}",
                        candidate.task.id, candidate.user_id, kind, err
                    );
                    summary.record_error(
                        Some(candidate.task.id),
                        Some(candidate.user_id),
                        err.to_string(),
                    );
                }
            }
        }

        log_finish(&summary);
        summary
    }
}

fn process_candidate<P: PreferenceRepository, L: ReminderLedger>(
    kind: ReminderKind,
    candidate: &Candidate,
    now: DateTime<FixedOffset>,
    resolver: &mut PolicyResolver<'_, P>,
    evaluator: &ReminderEvaluator<'_, L>,
    emitter: &NotificationEmitter<'_>,
    summary: &mut PassSummary,
) -> RepoResult<()> {
    let policy = resolver.resolve(candidate.user_id)?;
    match evaluator.evaluate(kind, candidate, &policy, now)? {
        Decision::Skip(reason) => summary.record_skip(reason),
        Decision::Emit(plan) => {
            if emitter.emit(&plan, now.timestamp_millis())? {
                summary.record_sent(kind);
            } else {
                summary.lost_race += 1;
            }
        }
    }
    Ok(())
}

fn log_finish(summary: &PassSummary) {
    info!(
        "event=pass_finish module=reminder status={} ran_at={} candidates={} due_soon_sent={} overdue_sent={} already_sent={} quiet_hours_deferred={} lost_race={} error_count={}",
        if summary.error_count == 0 { "ok" } else { "partial" },
        summary.ran_at,
        summary.candidates,
        summary.due_soon_sent,
        summary.overdue_sent,
        summary.already_sent,
        summary.quiet_hours_deferred,
        summary.lost_race,
        summary.error_count
    );
}

#[cfg(test)]
mod tests {
    use super::{PassSummary, ScanDriver};
    use crate::db::open_db_in_memory;
    use crate::reminder::evaluator::SkipReason;
    use crate::reminder::EngineSettings;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn empty_store_yields_an_empty_successful_summary() {
        let conn = open_db_in_memory().unwrap();
        let now = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .unwrap();

        let summary = ScanDriver::new(&conn, EngineSettings::default()).run_pass(now);
        assert_eq!(summary.ran_at, now.timestamp_millis());
        assert_eq!(summary.candidates, 0);
        assert_eq!(summary.sent(), 0);
        assert!(summary.errors.is_empty());
    }

    #[test]
    fn skip_reasons_map_to_their_counters() {
        let mut summary = PassSummary::default();
        summary.record_skip(SkipReason::AlreadySent);
        summary.record_skip(SkipReason::QuietHours);
        summary.record_skip(SkipReason::QuietHours);
        summary.record_skip(SkipReason::DisabledByPolicy);
        summary.record_skip(SkipReason::OutsideWindow);
        assert_eq!(summary.already_sent, 1);
        assert_eq!(summary.quiet_hours_deferred, 2);
        assert_eq!(summary.disabled_by_policy, 1);
        assert_eq!(summary.outside_window, 1);

        summary.record_error(None, None, "boom".to_string());
        assert_eq!(summary.error_count, 1);
    }
}
