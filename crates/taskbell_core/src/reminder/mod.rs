//! Due-date reminder engine.
//!
//! # Responsibility
//! - Scan dated tasks, decide per (task, user, kind) whether a reminder is
//!   due right now, and emit each logical reminder exactly once.
//!
//! # Invariants
//! - No internal scheduling loop: a pass runs synchronously when triggered.
//! - The only shared mutable state is the reminder ledger; every emission is
//!   gated by its atomic claim, so overlapping passes cannot double-send.
//!
//! # Flow
//! `driver` → `scanner` → `evaluator` (consults `policy`, `quiet_hours`,
//! ledger) → `emitter` (notification + ledger claim in one transaction).

pub mod driver;
pub mod emitter;
pub mod evaluator;
pub mod policy;
pub mod quiet_hours;
pub mod scanner;
pub mod trigger;

use chrono::TimeDelta;

/// Default ceiling for a user's lead time, also the due-soon scan horizon.
pub const DEFAULT_MAX_LEAD_TIME_HOURS: i64 = 30 * 24;

/// Tunables shared by every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Stored lead times are clamped to this; due-soon candidates are only
    /// fetched up to `now + max_lead_time`.
    pub max_lead_time: TimeDelta,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_lead_time: TimeDelta::hours(DEFAULT_MAX_LEAD_TIME_HOURS),
        }
    }
}
