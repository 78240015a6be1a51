//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for boards, tasks,
//!   preferences, the reminder ledger and notifications.
//! - Isolate SQLite query details from the reminder engine.
//!
//! # Invariants
//! - Write paths validate model records before persistence.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod ledger_repo;
pub mod notification_repo;
pub mod preference_repo;
pub mod task_repo;

use crate::repo::task_repo::{RepoError, RepoResult};
use uuid::Uuid;

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(value: Option<String>, column: &str) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

pub(crate) fn parse_flag(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn parse_optional_flag(value: Option<i64>, column: &str) -> RepoResult<Option<bool>> {
    value.map(|raw| parse_flag(raw, column)).transpose()
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
