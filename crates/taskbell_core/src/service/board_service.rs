//! Board/task use-case service.
//!
//! # Responsibility
//! - Provide the board mutations that feed the reminder engine: dated tasks,
//!   assignment and archival.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - Mutating a missing task returns `RepoError::NotFound`.

use crate::model::task::{Board, BoardId, Task, TaskId, UserId};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};

/// Use-case service wrapper for board and task writes.
pub struct BoardService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> BoardService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a board; `owner_id` is the reminder target for unassigned tasks.
    pub fn create_board(
        &self,
        name: impl Into<String>,
        owner_id: Option<UserId>,
    ) -> RepoResult<BoardId> {
        self.repo.create_board(&Board::new(name, owner_id))
    }

    /// Creates an unassigned task on an existing board.
    pub fn create_task(
        &self,
        board_id: BoardId,
        title: impl Into<String>,
        due_at: Option<i64>,
    ) -> RepoResult<TaskId> {
        if self.repo.get_board(board_id)?.is_none() {
            return Err(RepoError::NotFound(board_id));
        }
        let mut task = Task::new(board_id, title);
        task.due_at = due_at;
        self.repo.create_task(&task)
    }

    /// Sets or clears the due timestamp (epoch ms).
    pub fn set_due_at(&self, task_id: TaskId, due_at: Option<i64>) -> RepoResult<()> {
        self.modify(task_id, |task| task.due_at = due_at)
    }

    /// Sets or clears the assignee.
    pub fn assign(&self, task_id: TaskId, assignee_id: Option<UserId>) -> RepoResult<()> {
        self.modify(task_id, |task| task.assignee_id = assignee_id)
    }

    pub fn archive(&self, task_id: TaskId) -> RepoResult<()> {
        self.modify(task_id, |task| task.is_archived = true)
    }

    pub fn get_task(&self, task_id: TaskId) -> RepoResult<Option<Task>> {
        self.repo.get_task(task_id)
    }

    fn modify(&self, task_id: TaskId, change: impl FnOnce(&mut Task)) -> RepoResult<()> {
        let mut task = self
            .repo
            .get_task(task_id)?
            .ok_or(RepoError::NotFound(task_id))?;
        change(&mut task);
        self.repo.update_task(&task)
    }
}
