use chrono::{FixedOffset, TimeZone};
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;
use taskbell_core::db::{open_db, DbError};
use taskbell_core::{
    hash_token, run_triggered_pass, BoardService, Clock, EngineSettings, FixedClock,
    NotificationRepository, PassSummary, SqliteNotificationRepository, SqliteTaskRepository,
    TriggerError, TriggerGuard,
};
use uuid::Uuid;

#[derive(Debug)]
enum PassFailure {
    Trigger(TriggerError),
    Db(DbError),
}

impl From<TriggerError> for PassFailure {
    fn from(value: TriggerError) -> Self {
        Self::Trigger(value)
    }
}

fn clock() -> FixedClock {
    FixedClock::new(
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 10, 12, 0, 0)
            .unwrap(),
    )
}

fn opener(path: &Path) -> impl FnOnce() -> Result<Connection, PassFailure> + '_ {
    move || open_db(path).map_err(PassFailure::Db)
}

fn rejection(result: Result<PassSummary, PassFailure>) -> TriggerError {
    match result {
        Err(PassFailure::Trigger(err)) => err,
        Err(PassFailure::Db(err)) => panic!("database opened before rejection: {err}"),
        Ok(summary) => panic!("pass ran without authorization: {summary:?}"),
    }
}

#[test]
fn rejected_trigger_never_touches_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskbell.db");
    let clock = clock();
    let settings = EngineSettings::default();
    let guard = TriggerGuard::from_hex_digest(Some(&hash_token("correct horse"))).unwrap();
    let unconfigured = TriggerGuard::from_hex_digest(None).unwrap();

    assert_eq!(
        rejection(run_triggered_pass(
            &guard,
            Some("battery staple"),
            &clock,
            settings,
            opener(&path)
        )),
        TriggerError::Unauthorized
    );
    assert_eq!(
        rejection(run_triggered_pass(&guard, None, &clock, settings, opener(&path))),
        TriggerError::MissingToken
    );
    assert_eq!(
        rejection(run_triggered_pass(
            &unconfigured,
            Some("correct horse"),
            &clock,
            settings,
            opener(&path)
        )),
        TriggerError::NotConfigured
    );
    assert!(!path.exists());
}

#[test]
fn unauthorized_trigger_never_scans() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskbell.db");
    let conn = open_db(&path).unwrap();
    let owner = Uuid::new_v4();
    let clock = clock();
    let settings = EngineSettings::default();
    let service = BoardService::new(SqliteTaskRepository::new(&conn));
    let board = service.create_board("Ops", Some(owner)).unwrap();
    service
        .create_task(board, "late", Some(clock.now().timestamp_millis() - 1_000))
        .unwrap();

    let guard = TriggerGuard::from_hex_digest(Some(&hash_token("correct horse"))).unwrap();
    assert_eq!(
        rejection(run_triggered_pass(
            &guard,
            Some("battery staple"),
            &clock,
            settings,
            opener(&path)
        )),
        TriggerError::Unauthorized
    );
    let notifications = SqliteNotificationRepository::new(&conn);
    assert!(notifications.list_for_user(owner, None).unwrap().is_empty());

    let summary =
        run_triggered_pass(&guard, Some("correct horse"), &clock, settings, opener(&path))
            .unwrap();
    assert_eq!(summary.overdue_sent, 1);
    assert_eq!(notifications.list_for_user(owner, None).unwrap().len(), 1);
}

#[test]
fn pass_summary_serializes_to_a_stable_json_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskbell.db");
    let conn = open_db(&path).unwrap();
    let clock = clock();
    let service = BoardService::new(SqliteTaskRepository::new(&conn));
    let board = service.create_board("Unowned", None).unwrap();
    let orphan = service
        .create_task(board, "orphan", Some(clock.now().timestamp_millis() + 1_000))
        .unwrap();

    let guard = TriggerGuard::from_hex_digest(Some(&hash_token("s"))).unwrap();
    let summary = run_triggered_pass(
        &guard,
        Some("s"),
        &clock,
        EngineSettings::default(),
        opener(&path),
    )
    .unwrap();
    let json = serde_json::to_value(&summary).unwrap();

    for field in [
        "ran_at",
        "candidates",
        "due_soon_sent",
        "overdue_sent",
        "already_sent",
        "quiet_hours_deferred",
        "disabled_by_policy",
        "outside_window",
        "lost_race",
        "error_count",
    ] {
        assert!(json[field].is_number(), "missing numeric field {field}");
    }
    assert_eq!(json["ran_at"], Value::from(clock.now().timestamp_millis()));
    assert_eq!(json["error_count"], Value::from(1));
    let error = &json["errors"][0];
    assert_eq!(error["task_id"], Value::from(orphan.to_string()));
    assert!(error.get("user_id").is_none());
    assert!(error["message"].as_str().unwrap().contains("board owner"));
}
