//! Core logic for Taskbell, the due-date reminder engine.
//! This crate is the single source of truth for reminder invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::notification::Notification;
pub use model::preference::{NotificationPolicy, QuietHours, StoredPreferences};
pub use model::reminder::{Channel, LedgerKey, ReminderKind, ReminderLedgerEntry, ReminderPeriod};
pub use model::task::{Board, BoardId, Task, TaskId, UserId};
pub use model::ModelValidationError;
pub use reminder::driver::{PassError, PassSummary, ScanDriver};
pub use reminder::trigger::{hash_token, run_triggered_pass, TriggerError, TriggerGuard};
pub use reminder::EngineSettings;
pub use repo::ledger_repo::{ReminderLedger, SqliteReminderLedger};
pub use repo::notification_repo::{NotificationRepository, SqliteNotificationRepository};
pub use repo::preference_repo::{PreferenceRepository, SqlitePreferenceRepository};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use service::board_service::BoardService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
