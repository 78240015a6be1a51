use chrono::{FixedOffset, TimeZone};
use std::path::Path;
use taskbell_core::db::open_db;
use taskbell_core::{
    BoardService, EngineSettings, NotificationRepository, PassSummary, ReminderLedger, ScanDriver,
    SqliteNotificationRepository, SqliteReminderLedger, SqliteTaskRepository,
};
use uuid::Uuid;

const PASSES: usize = 8;

fn overlapping_passes(path: &Path, now: chrono::DateTime<FixedOffset>) -> Vec<PassSummary> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..PASSES)
            .map(|_| {
                scope.spawn(move || {
                    let conn = open_db(path).unwrap();
                    ScanDriver::new(&conn, EngineSettings::default()).run_pass(now)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    })
}

#[test]
fn simultaneous_passes_emit_each_reminder_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskbell.db");
    let owner = Uuid::new_v4();
    let now = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 6, 10, 12, 0, 0)
        .unwrap();
    let now_ms = now.timestamp_millis();

    let (due_soon_task, overdue_task) = {
        let conn = open_db(&path).unwrap();
        let service = BoardService::new(SqliteTaskRepository::new(&conn));
        let board = service.create_board("Shared", Some(owner)).unwrap();
        (
            service
                .create_task(board, "soon", Some(now_ms + 3_600_000))
                .unwrap(),
            service
                .create_task(board, "late", Some(now_ms - 3_600_000))
                .unwrap(),
        )
    };

    let summaries = overlapping_passes(&path, now);

    let due_soon_sent: u32 = summaries.iter().map(|summary| summary.due_soon_sent).sum();
    let overdue_sent: u32 = summaries.iter().map(|summary| summary.overdue_sent).sum();
    let suppressed: u32 = summaries
        .iter()
        .map(|summary| summary.already_sent + summary.lost_race)
        .sum();
    assert_eq!(due_soon_sent, 1);
    assert_eq!(overdue_sent, 1);
    assert_eq!(suppressed, 2 * (PASSES as u32 - 1));
    assert!(summaries.iter().all(|summary| summary.error_count == 0));

    let conn = open_db(&path).unwrap();
    let ledger = SqliteReminderLedger::new(&conn);
    assert_eq!(ledger.list_for_task(due_soon_task).unwrap().len(), 1);
    assert_eq!(ledger.list_for_task(overdue_task).unwrap().len(), 1);
    let notifications = SqliteNotificationRepository::new(&conn);
    assert_eq!(notifications.count_for_task(due_soon_task, "due_soon").unwrap(), 1);
    assert_eq!(notifications.count_for_task(overdue_task, "overdue").unwrap(), 1);
}

#[test]
fn a_second_wave_of_passes_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskbell.db");
    let owner = Uuid::new_v4();
    let now = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 6, 10, 12, 0, 0)
        .unwrap();
    {
        let conn = open_db(&path).unwrap();
        let service = BoardService::new(SqliteTaskRepository::new(&conn));
        let board = service.create_board("Shared", Some(owner)).unwrap();
        service
            .create_task(board, "soon", Some(now.timestamp_millis() + 3_600_000))
            .unwrap();
    }

    let first: u32 = overlapping_passes(&path, now)
        .iter()
        .map(PassSummary::sent)
        .sum();
    let second: u32 = overlapping_passes(&path, now)
        .iter()
        .map(PassSummary::sent)
        .sum();
    assert_eq!(first, 1);
    assert_eq!(second, 0);

    let conn = open_db(&path).unwrap();
    assert_eq!(
        SqliteNotificationRepository::new(&conn)
            .list_for_user(owner, None)
            .unwrap()
            .len(),
        1
    );
}
