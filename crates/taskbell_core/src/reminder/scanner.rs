//! Candidate scanner: finds (task, target user) pairs worth evaluating.
//!
//! # Invariants
//! - Due-soon candidates have `due_at` strictly after `now`; overdue
//!   candidates have `due_at` at or before `now`. The classes are disjoint.
//! - A task with neither assignee nor board owner is excluded and reported,
//!   never fatal.

use crate::model::task::{DueTask, Task, TaskId, UserId};
use crate::repo::task_repo::{RepoResult, TaskRepository};
use chrono::{DateTime, FixedOffset, TimeDelta};
use log::warn;

/// One (task, target user) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub task: Task,
    pub user_id: UserId,
    /// Epoch ms; copied out of the task so evaluation never re-reads it.
    pub due_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    pub due_soon: Vec<Candidate>,
    pub overdue: Vec<Candidate>,
    /// Tasks skipped because no target user could be resolved.
    pub unresolved: Vec<TaskId>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.due_soon.len() + self.overdue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.due_soon.is_empty() && self.overdue.is_empty()
    }
}

pub struct CandidateScanner<'r, R: TaskRepository> {
    repo: &'r R,
    horizon: TimeDelta,
}

impl<'r, R: TaskRepository> CandidateScanner<'r, R> {
    /// `horizon` bounds how far ahead due-soon tasks are fetched.
    pub fn new(repo: &'r R, horizon: TimeDelta) -> Self {
        Self { repo, horizon }
    }

    pub fn scan(&self, now: DateTime<FixedOffset>) -> RepoResult<CandidateSet> {
        let now_ms = now.timestamp_millis();
        let horizon_end_ms = now_ms.saturating_add(self.horizon.num_milliseconds());

        let mut set = CandidateSet::default();
        for due_task in self.repo.list_due_soon_candidates(now_ms, horizon_end_ms)? {
            if let Some(candidate) = to_candidate(due_task, &mut set.unresolved) {
                set.due_soon.push(candidate);
            }
        }
        for due_task in self.repo.list_overdue_candidates(now_ms)? {
            if let Some(candidate) = to_candidate(due_task, &mut set.unresolved) {
                set.overdue.push(candidate);
            }
        }
        Ok(set)
    }
}

fn to_candidate(due_task: DueTask, unresolved: &mut Vec<TaskId>) -> Option<Candidate> {
    let due_at = due_task.due_at()?;
    let task_id = due_task.task.id;
    let Some(user_id) = due_task.target_user() else {
        warn!(
            "event=candidate_skipped module=reminder status=skipped task_id={task_id} reason=no_target_user"
        );
        unresolved.push(task_id);
        return None;
    };
    Some(Candidate {
        task: due_task.task,
        user_id,
        due_at,
    })
}

#[cfg(test)]
mod tests {
    use super::CandidateScanner;
    use crate::db::open_db_in_memory;
    use crate::model::task::{Board, Task};
    use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
    use chrono::{FixedOffset, TimeDelta, TimeZone};
    use uuid::Uuid;

    #[test]
    fn splits_classes_and_resolves_targets() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteTaskRepository::new(&conn);
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, 12, 0, 0)
            .unwrap();
        let now_ms = now.timestamp_millis();
        let owner = Uuid::new_v4();
        let assignee = Uuid::new_v4();

        let owned = Board::new("owned", Some(owner));
        let unowned = Board::new("unowned", None);
        repo.create_board(&owned).unwrap();
        repo.create_board(&unowned).unwrap();

        let mut soon = Task::new(owned.id, "soon");
        soon.due_at = Some(now_ms + 60_000);
        soon.assignee_id = Some(assignee);
        let mut late = Task::new(owned.id, "late");
        late.due_at = Some(now_ms);
        let mut orphan = Task::new(unowned.id, "orphan");
        orphan.due_at = Some(now_ms - 60_000);
        for task in [&soon, &late, &orphan] {
            repo.create_task(task).unwrap();
        }

        let set = CandidateScanner::new(&repo, TimeDelta::hours(1))
            .scan(now)
            .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.due_soon[0].task.id, soon.id);
        assert_eq!(set.due_soon[0].user_id, assignee);
        assert_eq!(set.overdue[0].task.id, late.id);
        assert_eq!(set.overdue[0].user_id, owner);
        assert_eq!(set.unresolved, vec![orphan.id]);
    }

    #[test]
    fn horizon_bounds_the_due_soon_query() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteTaskRepository::new(&conn);
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, 12, 0, 0)
            .unwrap();
        let board = Board::new("far", Some(Uuid::new_v4()));
        repo.create_board(&board).unwrap();
        let mut far = Task::new(board.id, "far");
        far.due_at = Some(now.timestamp_millis() + TimeDelta::hours(2).num_milliseconds());
        repo.create_task(&far).unwrap();

        let set = CandidateScanner::new(&repo, TimeDelta::hours(1))
            .scan(now)
            .unwrap();
        assert!(set.is_empty());
        assert!(set.unresolved.is_empty());
    }
}
