#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use deadline_core::{FixedClock, NewDeadline, Priority, SqliteDeadlineStore};
use rusqlite::Connection;

/// Reference "now" shared by store tests.
pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn days_from_base(days: i64) -> NaiveDateTime {
    base_time() + Duration::days(days)
}

pub fn store_at(conn: &Connection, now: NaiveDateTime) -> SqliteDeadlineStore<'_, FixedClock> {
    SqliteDeadlineStore::with_clock(conn, FixedClock(now)).unwrap()
}

pub fn new_deadline(title: &str, due_in_days: i64, priority: Priority) -> NewDeadline {
    NewDeadline::new(title, days_from_base(due_in_days), priority, "Work")
}
