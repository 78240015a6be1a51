//! Board/task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the typed board/task reads the reminder engine consumes.
//! - Provide the minimal writes needed to populate a board.
//!
//! # Invariants
//! - Candidate queries never return archived or undated tasks.
//! - Candidate rows carry the owning board's owner as fallback target.
//! - Candidate ordering is deterministic: `due_at ASC, uuid ASC`.

use crate::db::DbError;
use crate::model::task::{Board, BoardId, DueTask, Task, TaskId};
use crate::model::ModelValidationError;
use crate::repo::{bool_to_int, parse_flag, parse_optional_uuid, parse_uuid};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DUE_TASK_SELECT_SQL: &str = "SELECT
    t.uuid AS uuid,
    t.board_uuid AS board_uuid,
    t.title AS title,
    t.due_at AS due_at,
    t.is_archived AS is_archived,
    t.assignee_id AS assignee_id,
    b.owner_id AS board_owner_id
FROM tasks t
INNER JOIN boards b ON b.uuid = t.board_uuid";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for board, task, preference, ledger and
/// notification persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for board and task data.
pub trait TaskRepository {
    fn create_board(&self, board: &Board) -> RepoResult<BoardId>;
    fn get_board(&self, id: BoardId) -> RepoResult<Option<Board>>;
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Active tasks with `now < due_at <= horizon_end`.
    fn list_due_soon_candidates(&self, now_ms: i64, horizon_end_ms: i64)
        -> RepoResult<Vec<DueTask>>;
    /// Active tasks with `due_at <= now`.
    fn list_overdue_candidates(&self, now_ms: i64) -> RepoResult<Vec<DueTask>>;
}

/// SQLite-backed board/task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_due_tasks(&self, sql: &str, bounds: &[i64]) -> RepoResult<Vec<DueTask>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(bounds.iter()))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_due_task_row(row)?);
        }
        Ok(tasks)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_board(&self, board: &Board) -> RepoResult<BoardId> {
        board.validate()?;

        self.conn.execute(
            "INSERT INTO boards (uuid, name, owner_id) VALUES (?1, ?2, ?3);",
            params![
                board.id.to_string(),
                board.name.trim(),
                board.owner_id.map(|id| id.to_string()),
            ],
        )?;

        Ok(board.id)
    }

    fn get_board(&self, id: BoardId) -> RepoResult<Option<Board>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, name, owner_id FROM boards WHERE uuid = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("uuid")?,
                        row.get::<_, String>("name")?,
                        row.get::<_, Option<String>>("owner_id")?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((uuid, name, owner_id)) => Ok(Some(Board {
                id: parse_uuid(&uuid, "boards.uuid")?,
                name,
                owner_id: parse_optional_uuid(owner_id, "boards.owner_id")?,
            })),
            None => Ok(None),
        }
    }

    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                uuid,
                board_uuid,
                title,
                due_at,
                is_archived,
                assignee_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                task.id.to_string(),
                task.board_id.to_string(),
                task.title.as_str(),
                task.due_at,
                bool_to_int(task.is_archived),
                task.assignee_id.map(|id| id.to_string()),
            ],
        )?;

        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                board_uuid = ?1,
                title = ?2,
                due_at = ?3,
                is_archived = ?4,
                assignee_id = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6;",
            params![
                task.board_id.to_string(),
                task.title.as_str(),
                task.due_at,
                bool_to_int(task.is_archived),
                task.assignee_id.map(|id| id.to_string()),
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DUE_TASK_SELECT_SQL} WHERE t.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_due_task_row(row)?.task));
        }
        Ok(None)
    }

    fn list_due_soon_candidates(
        &self,
        now_ms: i64,
        horizon_end_ms: i64,
    ) -> RepoResult<Vec<DueTask>> {
        self.query_due_tasks(
            &format!(
                "{DUE_TASK_SELECT_SQL}
                 WHERE t.is_archived = 0
                   AND t.due_at IS NOT NULL
                   AND t.due_at > ?1
                   AND t.due_at <= ?2
                 ORDER BY t.due_at ASC, t.uuid ASC;"
            ),
            &[now_ms, horizon_end_ms],
        )
    }

    fn list_overdue_candidates(&self, now_ms: i64) -> RepoResult<Vec<DueTask>> {
        self.query_due_tasks(
            &format!(
                "{DUE_TASK_SELECT_SQL}
                 WHERE t.is_archived = 0
                   AND t.due_at IS NOT NULL
                   AND t.due_at <= ?1
                 ORDER BY t.due_at ASC, t.uuid ASC;"
            ),
            &[now_ms],
        )
    }
}

fn parse_due_task_row(row: &Row<'_>) -> RepoResult<DueTask> {
    let uuid: String = row.get("uuid")?;
    let board_uuid: String = row.get("board_uuid")?;

    let task = Task {
        id: parse_uuid(&uuid, "tasks.uuid")?,
        board_id: parse_uuid(&board_uuid, "tasks.board_uuid")?,
        title: row.get("title")?,
        due_at: row.get("due_at")?,
        is_archived: parse_flag(row.get("is_archived")?, "tasks.is_archived")?,
        assignee_id: parse_optional_uuid(row.get("assignee_id")?, "tasks.assignee_id")?,
    };

    Ok(DueTask {
        task,
        board_owner_id: parse_optional_uuid(row.get("board_owner_id")?, "boards.owner_id")?,
    })
}
