mod common;

use common::{base_time, days_from_base, new_deadline, store_at};
use deadline_core::db::migrations::latest_version;
use deadline_core::db::open_db_in_memory;
use chrono::NaiveDate;
use deadline_core::{
    DeadlineStatus, DeadlineStore, DeadlineValidationError, NewDeadline, Priority, RepoError,
    SqliteDeadlineStore,
};
use rusqlite::Connection;

#[test]
fn add_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());

    let request = NewDeadline::new("Pay Bill", days_from_base(1), Priority::Medium, "Personal")
        .with_description("electricity");
    let id = store.add(&request).unwrap();
    assert_eq!(id, 1);

    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.title, "Pay Bill");
    assert_eq!(loaded.description, "electricity");
    assert_eq!(loaded.due_date, days_from_base(1));
    assert_eq!(loaded.priority, Priority::Medium);
    assert_eq!(loaded.category, "Personal");
    assert_eq!(loaded.status, DeadlineStatus::Pending);
    assert_eq!(loaded.created_at, base_time());
    assert_eq!(loaded.completed_at, None);
}

#[test]
fn get_missing_id_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());

    assert!(store.get(42).unwrap().is_none());
}

#[test]
fn store_does_not_reject_empty_title() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());

    let id = store.add(&new_deadline("", 1, Priority::Low)).unwrap();
    assert_eq!(store.get(id).unwrap().unwrap().title, "");
}

#[test]
fn ids_are_unique_and_not_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());

    let first = store.add(&new_deadline("a", 1, Priority::Low)).unwrap();
    let second = store.add(&new_deadline("b", 1, Priority::Low)).unwrap();
    assert_ne!(first, second);

    assert!(store.delete(second).unwrap());
    let third = store.add(&new_deadline("c", 1, Priority::Low)).unwrap();
    assert!(third > second);
}

#[test]
fn completed_at_tracks_completed_status() {
    let conn = open_db_in_memory().unwrap();
    let id = store_at(&conn, base_time())
        .add(&new_deadline("report", 3, Priority::High))
        .unwrap();

    let later = days_from_base(1);
    let store = store_at(&conn, later);

    assert!(store.update_status(id, DeadlineStatus::InProgress).unwrap());
    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded.status, DeadlineStatus::InProgress);
    assert_eq!(loaded.completed_at, None);

    assert!(store.update_status(id, DeadlineStatus::Completed).unwrap());
    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded.status, DeadlineStatus::Completed);
    assert_eq!(loaded.completed_at, Some(later));

    assert!(store.update_status(id, DeadlineStatus::Pending).unwrap());
    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded.status, DeadlineStatus::Pending);
    assert_eq!(loaded.completed_at, None);
}

#[test]
fn update_status_on_missing_id_returns_false() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());

    assert!(!store.update_status(9, DeadlineStatus::Completed).unwrap());
}

#[test]
fn update_priority_changes_only_priority() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());
    let id = store.add(&new_deadline("exam", 5, Priority::Low)).unwrap();

    assert!(store.update_priority(id, Priority::Urgent).unwrap());
    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded.priority, Priority::Urgent);
    assert_eq!(loaded.status, DeadlineStatus::Pending);

    assert!(!store.update_priority(id + 1, Priority::High).unwrap());
}

#[test]
fn delete_missing_id_returns_false_and_keeps_count() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());
    store.add(&new_deadline("a", 1, Priority::Low)).unwrap();
    store.add(&new_deadline("b", 2, Priority::Low)).unwrap();

    assert!(!store.delete(99).unwrap());
    assert_eq!(store.count().unwrap(), 2);

    assert!(store.delete(1).unwrap());
    assert_eq!(store.count().unwrap(), 1);
    assert!(store.get(1).unwrap().is_none());
}

#[test]
fn list_orders_by_due_date_and_hides_completed_by_default() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());
    let late = store.add(&new_deadline("late", 9, Priority::Low)).unwrap();
    let early = store.add(&new_deadline("early", 2, Priority::Low)).unwrap();
    let done = store.add(&new_deadline("done", 4, Priority::Low)).unwrap();
    store.update_status(done, DeadlineStatus::Completed).unwrap();

    let open: Vec<_> = store.list(false).unwrap().into_iter().map(|d| d.id).collect();
    assert_eq!(open, vec![early, late]);

    let all = store.list(true).unwrap();
    let ids: Vec<_> = all.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![early, done, late]);
    assert!(all
        .iter()
        .all(|d| d.completed_at.is_some() == (d.status == DeadlineStatus::Completed)));
}

#[test]
fn list_upcoming_returns_window_in_due_order() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());
    let far = store.add(&new_deadline("ten", 10, Priority::Low)).unwrap();
    let mid = store.add(&new_deadline("five", 5, Priority::Low)).unwrap();
    let near = store.add(&new_deadline("one", 1, Priority::Low)).unwrap();

    let upcoming: Vec<_> = store
        .list_upcoming(7)
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(upcoming, vec![near, mid]);
    assert!(!upcoming.contains(&far));
}

#[test]
fn list_upcoming_bounds_are_inclusive_and_skip_completed_and_past() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());
    let at_now = store.add(&new_deadline("now", 0, Priority::Low)).unwrap();
    let at_edge = store.add(&new_deadline("edge", 3, Priority::Low)).unwrap();
    store.add(&new_deadline("past", -1, Priority::Low)).unwrap();
    let done = store.add(&new_deadline("done", 1, Priority::Low)).unwrap();
    store.update_status(done, DeadlineStatus::Completed).unwrap();

    let upcoming: Vec<_> = store
        .list_upcoming(3)
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(upcoming, vec![at_now, at_edge]);
}

#[test]
fn list_upcoming_with_window_past_year_9999_still_finds_near_deadlines() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());
    let near = store.add(&new_deadline("near", 1, Priority::Low)).unwrap();

    for days in [4_000_000, u32::MAX] {
        let upcoming: Vec<_> = store
            .list_upcoming(days)
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(upcoming, vec![near], "days = {days}");
    }
}

#[test]
fn add_rejects_due_date_outside_four_digit_years() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());
    let far_future = NaiveDate::from_ymd_opt(10_000, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let err = store
        .add(&NewDeadline::new("Someday", far_future, Priority::Low, "Work"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(DeadlineValidationError::DueDateOutOfRange(due)) if due == far_future
    ));
    assert_eq!(store.count().unwrap(), 0);
    assert!(store.list_overdue().unwrap().is_empty());

    let last_day = NaiveDate::from_ymd_opt(9999, 12, 31)
        .unwrap()
        .and_hms_opt(23, 59, 59)
        .unwrap();
    let id = store
        .add(&NewDeadline::new("Last day", last_day, Priority::Low, "Work"))
        .unwrap();
    assert!(store.list_overdue().unwrap().is_empty());
    assert_eq!(
        store.get(id).unwrap().unwrap().status,
        DeadlineStatus::Pending
    );
}

#[test]
fn list_overdue_escalates_past_due_deadlines_once() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());
    let id = store
        .add(&NewDeadline::new(
            "Pay Bill",
            days_from_base(1),
            Priority::Medium,
            "Personal",
        ))
        .unwrap();
    assert_eq!(store.get(id).unwrap().unwrap().status, DeadlineStatus::Pending);
    assert!(store.list_overdue().unwrap().is_empty());

    let later = store_at(&conn, days_from_base(2));
    let overdue = later.list_overdue().unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, id);
    assert_eq!(overdue[0].status, DeadlineStatus::Overdue);
    assert!(overdue[0].due_date < later.now());

    let stored = later.get(id).unwrap().unwrap();
    assert_eq!(stored.status, DeadlineStatus::Overdue);
    assert_eq!(stored.completed_at, None);

    assert!(later.list_overdue().unwrap().is_empty());
    assert_eq!(later.get(id).unwrap().unwrap().status, DeadlineStatus::Overdue);
}

#[test]
fn list_overdue_skips_completed_and_orders_by_due_date() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());
    let recent = store.add(&new_deadline("recent", -1, Priority::Low)).unwrap();
    let oldest = store.add(&new_deadline("oldest", -5, Priority::Low)).unwrap();
    let done = store.add(&new_deadline("done", -3, Priority::Low)).unwrap();
    let working = store.add(&new_deadline("working", -2, Priority::Low)).unwrap();
    store.update_status(done, DeadlineStatus::Completed).unwrap();
    store
        .update_status(working, DeadlineStatus::InProgress)
        .unwrap();

    let overdue: Vec<_> = store
        .list_overdue()
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(overdue, vec![oldest, working, recent]);
    assert_eq!(
        store.get(done).unwrap().unwrap().status,
        DeadlineStatus::Completed
    );
}

#[test]
fn list_skips_rows_with_corrupt_values_but_get_reports_them() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());
    let good = store.add(&new_deadline("good", 1, Priority::Low)).unwrap();
    let bad = store.add(&new_deadline("bad", 2, Priority::Low)).unwrap();
    conn.execute(
        "UPDATE deadlines SET due_date = 'someday' WHERE id = ?1;",
        [bad],
    )
    .unwrap();

    let listed: Vec<_> = store.list(true).unwrap().into_iter().map(|d| d.id).collect();
    assert_eq!(listed, vec![good]);

    let err = store.get(bad).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn store_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteDeadlineStore::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn store_rejects_connection_without_deadlines_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteDeadlineStore::try_new(&conn),
        Err(RepoError::MissingRequiredTable("deadlines"))
    ));
}

#[test]
fn store_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE deadlines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            due_date TEXT NOT NULL,
            priority INTEGER NOT NULL,
            status TEXT NOT NULL,
            category TEXT NOT NULL,
            created_at TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteDeadlineStore::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "deadlines",
            column: "completed_at"
        })
    ));
}

#[test]
fn storage_failure_surfaces_as_db_error() {
    let conn = open_db_in_memory().unwrap();
    let store = store_at(&conn, base_time());
    conn.execute_batch("DROP TABLE deadlines;").unwrap();

    assert!(matches!(
        store.add(&new_deadline("x", 1, Priority::Low)),
        Err(RepoError::Db(_))
    ));
    assert!(matches!(store.list(true), Err(RepoError::Db(_))));
    assert!(matches!(store.delete(1), Err(RepoError::Db(_))));
}
