//! Domain model for the board data the reminder engine reads and the
//! records it writes.
//!
//! # Invariants
//! - Every board, task and notification is identified by a stable UUID.
//! - Timestamps are Unix epoch milliseconds.

pub mod notification;
pub mod preference;
pub mod reminder;
pub mod task;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Write-path validation failures for model records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Board name is blank after trim.
    BlankBoardName,
    /// Task title is blank after trim.
    BlankTaskTitle,
    /// Quiet-hours bound is not a `HH:MM` time of day.
    InvalidQuietHours(String),
    /// Only one quiet-hours bound was provided.
    IncompleteQuietHours,
    /// Lead time must be strictly positive.
    NonPositiveLeadTime(i64),
    /// Lead time in minutes does not fit a duration.
    LeadTimeOutOfRange(i64),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankBoardName => write!(f, "board name must not be blank"),
            Self::BlankTaskTitle => write!(f, "task title must not be blank"),
            Self::InvalidQuietHours(value) => {
                write!(f, "quiet hours value `{value}` is not a HH:MM time")
            }
            Self::IncompleteQuietHours => {
                write!(f, "quiet hours need both a start and an end time")
            }
            Self::NonPositiveLeadTime(minutes) => {
                write!(f, "lead time must be positive, got {minutes} minutes")
            }
            Self::LeadTimeOutOfRange(minutes) => {
                write!(f, "lead time of {minutes} minutes is out of range")
            }
        }
    }
}

impl Error for ModelValidationError {}
