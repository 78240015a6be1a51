use rusqlite::Connection;
use taskbell_core::db::open_db_in_memory;
use taskbell_core::model::notification::Notification;
use taskbell_core::{
    BoardService, ModelValidationError, NotificationRepository, PreferenceRepository, RepoError,
    SqliteNotificationRepository, SqlitePreferenceRepository, SqliteTaskRepository,
    StoredPreferences, TaskRepository,
};
use uuid::Uuid;

#[test]
fn board_service_creates_and_mutates_tasks() {
    let conn = open_db_in_memory().unwrap();
    let service = BoardService::new(SqliteTaskRepository::new(&conn));
    let owner = Uuid::new_v4();
    let assignee = Uuid::new_v4();

    let board_id = service.create_board("Launch", Some(owner)).unwrap();
    let task_id = service
        .create_task(board_id, "Draft announcement", Some(1_000))
        .unwrap();

    service.set_due_at(task_id, Some(2_000)).unwrap();
    service.assign(task_id, Some(assignee)).unwrap();
    let loaded = service.get_task(task_id).unwrap().unwrap();
    assert_eq!(loaded.title, "Draft announcement");
    assert_eq!(loaded.due_at, Some(2_000));
    assert_eq!(loaded.assignee_id, Some(assignee));
    assert!(!loaded.is_archived);

    service.archive(task_id).unwrap();
    assert!(service.get_task(task_id).unwrap().unwrap().is_archived);
}

#[test]
fn board_service_reports_missing_records() {
    let conn = open_db_in_memory().unwrap();
    let service = BoardService::new(SqliteTaskRepository::new(&conn));
    let missing = Uuid::new_v4();

    assert!(matches!(
        service.create_task(missing, "orphan", None),
        Err(RepoError::NotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.set_due_at(missing, Some(1)),
        Err(RepoError::NotFound(id)) if id == missing
    ));
}

#[test]
fn blank_titles_and_names_are_rejected_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let service = BoardService::new(SqliteTaskRepository::new(&conn));

    assert!(matches!(
        service.create_board("   ", None),
        Err(RepoError::Validation(ModelValidationError::BlankBoardName))
    ));
    let board_id = service.create_board("Home", None).unwrap();
    assert!(matches!(
        service.create_task(board_id, "", None),
        Err(RepoError::Validation(ModelValidationError::BlankTaskTitle))
    ));
}

#[test]
fn candidate_queries_split_on_now_and_carry_board_owner() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(&conn);
    let service = BoardService::new(SqliteTaskRepository::new(&conn));
    let owner = Uuid::new_v4();
    let board_id = service.create_board("Ops", Some(owner)).unwrap();

    let past = service.create_task(board_id, "past", Some(900)).unwrap();
    let exactly_now = service.create_task(board_id, "now", Some(1_000)).unwrap();
    let later_b = service.create_task(board_id, "later b", Some(1_500)).unwrap();
    let later_a = service.create_task(board_id, "later a", Some(1_200)).unwrap();
    let beyond = service.create_task(board_id, "beyond", Some(5_000)).unwrap();
    service.create_task(board_id, "undated", None).unwrap();
    let archived = service.create_task(board_id, "archived", Some(1_100)).unwrap();
    service.archive(archived).unwrap();

    let due_soon: Vec<_> = repo
        .list_due_soon_candidates(1_000, 2_000)
        .unwrap()
        .into_iter()
        .map(|row| row.task.id)
        .collect();
    assert_eq!(due_soon, vec![later_a, later_b]);
    assert!(!due_soon.contains(&beyond));

    let overdue = repo.list_overdue_candidates(1_000).unwrap();
    let overdue_ids: Vec<_> = overdue.iter().map(|row| row.task.id).collect();
    assert_eq!(overdue_ids, vec![past, exactly_now]);
    assert!(overdue.iter().all(|row| row.board_owner_id == Some(owner)));
    assert!(overdue.iter().all(|row| row.target_user() == Some(owner)));
}

#[test]
fn preferences_roundtrip_and_missing_rows_are_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePreferenceRepository::new(&conn);
    let user = Uuid::new_v4();

    assert_eq!(repo.get_preferences(user).unwrap(), None);

    let mut record = StoredPreferences::empty(user);
    record.email_enabled = Some(false);
    record.lead_time_minutes = Some(90);
    record.quiet_hours_start = Some("22:00".to_string());
    record.quiet_hours_end = Some("07:00".to_string());
    repo.upsert_preferences(&record).unwrap();
    assert_eq!(repo.get_preferences(user).unwrap(), Some(record.clone()));

    record.email_enabled = None;
    record.push_enabled = Some(true);
    repo.upsert_preferences(&record).unwrap();
    assert_eq!(repo.get_preferences(user).unwrap(), Some(record));
}

#[test]
fn preference_writes_are_validated() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePreferenceRepository::new(&conn);
    let user = Uuid::new_v4();

    let mut bad_time = StoredPreferences::empty(user);
    bad_time.quiet_hours_start = Some("25:00".to_string());
    bad_time.quiet_hours_end = Some("07:00".to_string());
    assert!(matches!(
        repo.upsert_preferences(&bad_time),
        Err(RepoError::Validation(ModelValidationError::InvalidQuietHours(_)))
    ));

    let mut half_window = StoredPreferences::empty(user);
    half_window.quiet_hours_start = Some("22:00".to_string());
    assert!(matches!(
        repo.upsert_preferences(&half_window),
        Err(RepoError::Validation(ModelValidationError::IncompleteQuietHours))
    ));

    let mut zero_lead = StoredPreferences::empty(user);
    zero_lead.lead_time_minutes = Some(0);
    assert!(matches!(
        repo.upsert_preferences(&zero_lead),
        Err(RepoError::Validation(ModelValidationError::NonPositiveLeadTime(0)))
    ));

    let mut huge_lead = StoredPreferences::empty(user);
    huge_lead.lead_time_minutes = Some(i64::MAX);
    assert!(matches!(
        repo.upsert_preferences(&huge_lead),
        Err(RepoError::Validation(ModelValidationError::LeadTimeOutOfRange(_)))
    ));
    assert_eq!(repo.get_preferences(user).unwrap(), None);
}

#[test]
fn corrupt_persisted_flags_are_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    conn.execute(
        "INSERT INTO notification_preferences (user_id, in_app_enabled) VALUES (?1, 7);",
        [user.to_string()],
    )
    .unwrap();

    let result = SqlitePreferenceRepository::new(&conn).get_preferences(user);
    assert!(matches!(result, Err(RepoError::InvalidData(_))));
}

#[test]
fn notifications_list_newest_first_with_limit() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let task = Uuid::new_v4();
    for created_at in [100, 300, 200] {
        insert_notification(&conn, user, task, created_at);
    }
    insert_notification(&conn, Uuid::new_v4(), task, 400);

    let repo = SqliteNotificationRepository::new(&conn);
    let listed: Vec<i64> = repo
        .list_for_user(user, None)
        .unwrap()
        .iter()
        .map(|notification: &Notification| notification.created_at)
        .collect();
    assert_eq!(listed, vec![300, 200, 100]);

    assert_eq!(repo.list_for_user(user, Some(2)).unwrap().len(), 2);
    assert_eq!(repo.count_for_task(task, "due_soon").unwrap(), 4);
    assert_eq!(repo.count_for_task(task, "overdue").unwrap(), 0);
}

fn insert_notification(conn: &Connection, user: Uuid, task: Uuid, created_at: i64) {
    conn.execute(
        "INSERT INTO notifications (uuid, user_id, kind, title, message, task_uuid, created_at)
         VALUES (?1, ?2, 'due_soon', 'Task due soon', 'msg', ?3, ?4);",
        rusqlite::params![
            Uuid::new_v4().to_string(),
            user.to_string(),
            task.to_string(),
            created_at
        ],
    )
    .unwrap();
}
