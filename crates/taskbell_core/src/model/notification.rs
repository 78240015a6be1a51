//! User-facing notification record produced by the reminder engine.

use super::task::{BoardId, TaskId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type NotificationId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    /// `due_soon`, `overdue`, or a kind written by another producer.
    pub kind: String,
    pub title: String,
    pub message: String,
    pub task_id: Option<TaskId>,
    pub board_id: Option<BoardId>,
    /// Deep link the UI opens when the notification is selected.
    pub action_url: Option<String>,
    pub is_read: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Deep link to a task inside its board.
pub fn task_action_url(board_id: BoardId, task_id: TaskId) -> String {
    format!("/boards/{board_id}?task={task_id}")
}
