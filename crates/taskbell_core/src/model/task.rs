//! Board and task records as seen by the reminder engine.
//!
//! # Invariants
//! - A task with no `due_at`, or with `is_archived` set, is never a reminder
//!   candidate.
//! - The reminder target is the assignee when set, else the board owner.

use super::ModelValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BoardId = Uuid;
pub type TaskId = Uuid;
pub type UserId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    /// Fallback reminder target for unassigned tasks.
    pub owner_id: Option<UserId>,
}

impl Board {
    pub fn new(name: impl Into<String>, owner_id: Option<UserId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_id,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::BlankBoardName);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub board_id: BoardId,
    pub title: String,
    /// Unix epoch milliseconds.
    pub due_at: Option<i64>,
    pub is_archived: bool,
    pub assignee_id: Option<UserId>,
}

impl Task {
    /// Creates an unassigned, undated, active task with a generated ID.
    pub fn new(board_id: BoardId, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            board_id,
            title: title.into(),
            due_at: None,
            is_archived: false,
            assignee_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.title.trim().is_empty() {
            return Err(ModelValidationError::BlankTaskTitle);
        }
        Ok(())
    }
}

/// Candidate row: a dated, active task joined with its board owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTask {
    pub task: Task,
    pub board_owner_id: Option<UserId>,
}

impl DueTask {
    /// Resolves who should be reminded: assignee first, then board owner.
    pub fn target_user(&self) -> Option<UserId> {
        self.task.assignee_id.or(self.board_owner_id)
    }

    /// Due timestamp; candidate queries only return dated tasks, but the
    /// type still allows `None`.
    pub fn due_at(&self) -> Option<i64> {
        self.task.due_at
    }
}

#[cfg(test)]
mod tests {
    use super::{Board, DueTask, Task};
    use uuid::Uuid;

    #[test]
    fn target_prefers_assignee_over_board_owner() {
        let owner = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let board = Board::new("ops", Some(owner));
        let mut task = Task::new(board.id, "ship");
        task.assignee_id = Some(assignee);

        let candidate = DueTask {
            task: task.clone(),
            board_owner_id: board.owner_id,
        };
        assert_eq!(candidate.target_user(), Some(assignee));

        task.assignee_id = None;
        let fallback = DueTask {
            task,
            board_owner_id: board.owner_id,
        };
        assert_eq!(fallback.target_user(), Some(owner));
    }

    #[test]
    fn target_is_none_without_assignee_or_owner() {
        let board = Board::new("orphan", None);
        let candidate = DueTask {
            task: Task::new(board.id, "lost"),
            board_owner_id: None,
        };
        assert_eq!(candidate.target_user(), None);
    }

    #[test]
    fn blank_titles_and_names_are_rejected() {
        assert!(Board::new("  ", None).validate().is_err());
        assert!(Task::new(Uuid::new_v4(), "\t").validate().is_err());
        assert!(Task::new(Uuid::new_v4(), "write report").validate().is_ok());
    }
}
