//! Deadline store contract and SQLite implementation.
//!
//! # Responsibility
//! - CRUD and date-window queries over the `deadlines` table.
//! - Lazy overdue escalation inside `list_overdue`.
//!
//! # Invariants
//! - `completed_at` is written together with `status` in one statement, so
//!   it is non-null iff the status is `Completed`.
//! - `list_overdue` reads candidates and escalates them inside one
//!   `BEGIN IMMEDIATE` transaction.
//! - Timestamps are stored as fixed-width ISO-8601 text so string order
//!   matches time order.

use crate::clock::{Clock, SystemClock};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::deadline::{
    check_due_date, Deadline, DeadlineId, DeadlineStatus, DeadlineValidationError, NewDeadline,
    Priority, DUE_YEAR_RANGE,
};
use chrono::{Datelike, Duration, NaiveDateTime};
use log::{debug, error, info, warn};
use rusqlite::{params, Connection, Params, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEADLINE_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    due_date,
    priority,
    status,
    category,
    created_at,
    completed_at
FROM deadlines";

const DEADLINE_COLUMNS: [&str; 9] = [
    "id",
    "title",
    "description",
    "due_date",
    "priority",
    "status",
    "category",
    "created_at",
    "completed_at",
];

const TIMESTAMP_WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const TIMESTAMP_READ_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
/// Encoded form of the last instant of `DUE_YEAR_RANGE`.
const LATEST_TIMESTAMP: &str = "9999-12-31T23:59:59.999999";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for deadline persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(DeadlineValidationError),
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted deadline data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DeadlineValidationError> for RepoError {
    fn from(value: DeadlineValidationError) -> Self {
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

/// Durable storage of deadline records.
pub trait DeadlineStore {
    /// Inserts a `Pending` deadline stamped with `created_at = now`.
    ///
    /// Title and category are stored as given; see `NewDeadline::validate`.
    /// A due date outside `DUE_YEAR_RANGE` fails with `RepoError::Validation`.
    fn add(&self, deadline: &NewDeadline) -> RepoResult<DeadlineId>;
    fn get(&self, id: DeadlineId) -> RepoResult<Option<Deadline>>;
    /// All deadlines by due date ascending; `Completed` ones only on request.
    fn list(&self, include_completed: bool) -> RepoResult<Vec<Deadline>>;
    /// Non-completed deadlines due within `[now, now + days]`.
    fn list_upcoming(&self, days: u32) -> RepoResult<Vec<Deadline>>;
    /// Past-due deadlines not yet `Completed` or `Overdue`.
    ///
    /// # Side effects
    /// Every returned deadline is escalated to `Overdue` before this returns,
    /// so a second call does not report it again.
    fn list_overdue(&self) -> RepoResult<Vec<Deadline>>;
    /// Returns `false` when `id` does not exist.
    fn update_status(&self, id: DeadlineId, status: DeadlineStatus) -> RepoResult<bool>;
    /// Returns `false` when `id` does not exist.
    fn update_priority(&self, id: DeadlineId, priority: Priority) -> RepoResult<bool>;
    /// Permanently removes the row; `false` when `id` does not exist.
    fn delete(&self, id: DeadlineId) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<u64>;
    /// The instant this store measures due dates against.
    fn now(&self) -> NaiveDateTime;
}

impl<T: DeadlineStore + ?Sized> DeadlineStore for &T {
    fn add(&self, deadline: &NewDeadline) -> RepoResult<DeadlineId> {
        (**self).add(deadline)
    }

    fn get(&self, id: DeadlineId) -> RepoResult<Option<Deadline>> {
        (**self).get(id)
    }

    fn list(&self, include_completed: bool) -> RepoResult<Vec<Deadline>> {
        (**self).list(include_completed)
    }

    fn list_upcoming(&self, days: u32) -> RepoResult<Vec<Deadline>> {
        (**self).list_upcoming(days)
    }

    fn list_overdue(&self) -> RepoResult<Vec<Deadline>> {
        (**self).list_overdue()
    }

    fn update_status(&self, id: DeadlineId, status: DeadlineStatus) -> RepoResult<bool> {
        (**self).update_status(id, status)
    }

    fn update_priority(&self, id: DeadlineId, priority: Priority) -> RepoResult<bool> {
        (**self).update_priority(id, priority)
    }

    fn delete(&self, id: DeadlineId) -> RepoResult<bool> {
        (**self).delete(id)
    }

    fn count(&self) -> RepoResult<u64> {
        (**self).count()
    }

    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// SQLite-backed deadline store.
pub struct SqliteDeadlineStore<'conn, C: Clock = SystemClock> {
    conn: &'conn Connection,
    clock: C,
}

impl<'conn> SqliteDeadlineStore<'conn> {
    /// Creates a store over a migrated connection using the system clock.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_clock(conn, SystemClock)
    }
}

impl<'conn, C: Clock> SqliteDeadlineStore<'conn, C> {
    /// Creates a store over a migrated connection with an explicit clock.
    pub fn with_clock(conn: &'conn Connection, clock: C) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn, clock })
    }

    fn insert(&self, deadline: &NewDeadline) -> RepoResult<DeadlineId> {
        check_due_date(deadline.due_date)?;
        self.conn.execute(
            "INSERT INTO deadlines (
                title,
                description,
                due_date,
                priority,
                status,
                category,
                created_at,
                completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL);",
            params![
                deadline.title.as_str(),
                deadline.description.as_str(),
                encode_timestamp(deadline.due_date),
                deadline.priority.level(),
                DeadlineStatus::Pending.label(),
                deadline.category.as_str(),
                encode_timestamp(self.clock.now()),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(
            "event=deadline_add module=repo status=ok id={id} priority={}",
            deadline.priority
        );
        Ok(id)
    }

    fn select_one(&self, id: DeadlineId) -> RepoResult<Option<Deadline>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DEADLINE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_deadline_row(row)?));
        }
        Ok(None)
    }

    fn select_all(&self, include_completed: bool) -> RepoResult<Vec<Deadline>> {
        let deadlines = query_deadlines(
            self.conn,
            &format!(
                "{DEADLINE_SELECT_SQL}
                 WHERE (?1 = 1 OR status != ?2)
                 ORDER BY due_date ASC, id ASC;"
            ),
            params![
                i64::from(include_completed),
                DeadlineStatus::Completed.label()
            ],
        )?;
        debug!(
            "event=deadline_list module=repo status=ok include_completed={include_completed} count={}",
            deadlines.len()
        );
        Ok(deadlines)
    }

    fn select_upcoming(&self, days: u32) -> RepoResult<Vec<Deadline>> {
        let now = self.clock.now();
        let until = now
            .checked_add_signed(Duration::days(i64::from(days)))
            .filter(|until| until.year() <= *DUE_YEAR_RANGE.end())
            .map_or_else(|| LATEST_TIMESTAMP.to_string(), encode_timestamp);

        let deadlines = query_deadlines(
            self.conn,
            &format!(
                "{DEADLINE_SELECT_SQL}
                 WHERE due_date BETWEEN ?1 AND ?2
                   AND status != ?3
                 ORDER BY due_date ASC, id ASC;"
            ),
            params![
                encode_timestamp(now),
                until,
                DeadlineStatus::Completed.label()
            ],
        )?;
        debug!(
            "event=deadline_upcoming module=repo status=ok days={days} count={}",
            deadlines.len()
        );
        Ok(deadlines)
    }

    fn select_and_escalate_overdue(&self) -> RepoResult<Vec<Deadline>> {
        let now = self.clock.now();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let mut overdue = query_deadlines(
            &tx,
            &format!(
                "{DEADLINE_SELECT_SQL}
                 WHERE due_date < ?1
                   AND status NOT IN (?2, ?3)
                 ORDER BY due_date ASC, id ASC;"
            ),
            params![
                encode_timestamp(now),
                DeadlineStatus::Completed.label(),
                DeadlineStatus::Overdue.label()
            ],
        )?;
        escalate_overdue(&tx, &mut overdue)?;
        tx.commit()?;

        if !overdue.is_empty() {
            info!(
                "event=deadline_escalate module=repo status=ok count={}",
                overdue.len()
            );
        }
        Ok(overdue)
    }

    fn write_status(&self, id: DeadlineId, status: DeadlineStatus) -> RepoResult<bool> {
        let completed_at =
            (status == DeadlineStatus::Completed).then(|| encode_timestamp(self.clock.now()));
        let changed = self.conn.execute(
            "UPDATE deadlines
             SET status = ?2,
                 completed_at = ?3
             WHERE id = ?1;",
            params![id, status.label(), completed_at],
        )?;

        let found = changed > 0;
        info!("event=deadline_status module=repo status=ok id={id} new_status={status} found={found}");
        Ok(found)
    }

    fn write_priority(&self, id: DeadlineId, priority: Priority) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE deadlines SET priority = ?2 WHERE id = ?1;",
            params![id, priority.level()],
        )?;

        let found = changed > 0;
        info!(
            "event=deadline_priority module=repo status=ok id={id} priority={priority} found={found}"
        );
        Ok(found)
    }

    fn remove(&self, id: DeadlineId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM deadlines WHERE id = ?1;", [id])?;

        let found = changed > 0;
        info!("event=deadline_delete module=repo status=ok id={id} found={found}");
        Ok(found)
    }

    fn row_count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM deadlines;", [], |row| row.get(0))?;
        u64::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative count {count}")))
    }
}

impl<C: Clock> DeadlineStore for SqliteDeadlineStore<'_, C> {
    fn add(&self, deadline: &NewDeadline) -> RepoResult<DeadlineId> {
        logged("deadline_add", self.insert(deadline))
    }

    fn get(&self, id: DeadlineId) -> RepoResult<Option<Deadline>> {
        logged("deadline_get", self.select_one(id))
    }

    fn list(&self, include_completed: bool) -> RepoResult<Vec<Deadline>> {
        logged("deadline_list", self.select_all(include_completed))
    }

    fn list_upcoming(&self, days: u32) -> RepoResult<Vec<Deadline>> {
        logged("deadline_upcoming", self.select_upcoming(days))
    }

    fn list_overdue(&self) -> RepoResult<Vec<Deadline>> {
        logged("deadline_escalate", self.select_and_escalate_overdue())
    }

    fn update_status(&self, id: DeadlineId, status: DeadlineStatus) -> RepoResult<bool> {
        logged("deadline_status", self.write_status(id, status))
    }

    fn update_priority(&self, id: DeadlineId, priority: Priority) -> RepoResult<bool> {
        logged("deadline_priority", self.write_priority(id, priority))
    }

    fn delete(&self, id: DeadlineId) -> RepoResult<bool> {
        logged("deadline_delete", self.remove(id))
    }

    fn count(&self) -> RepoResult<u64> {
        logged("deadline_count", self.row_count())
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }
}

fn logged<T>(event: &'static str, result: RepoResult<T>) -> RepoResult<T> {
    if let Err(err) = &result {
        error!("event={event} module=repo status=error error={err}");
    }
    result
}

/// Marks each listed deadline `Overdue` in storage and in memory.
fn escalate_overdue(tx: &Transaction<'_>, deadlines: &mut [Deadline]) -> RepoResult<()> {
    let mut stmt = tx.prepare(
        "UPDATE deadlines
         SET status = ?2,
             completed_at = NULL
         WHERE id = ?1;",
    )?;
    for deadline in deadlines.iter_mut() {
        stmt.execute(params![deadline.id, DeadlineStatus::Overdue.label()])?;
        deadline.status = DeadlineStatus::Overdue;
        deadline.completed_at = None;
    }
    Ok(())
}

/// Runs a multi-row select, skipping rows whose stored values do not decode.
fn query_deadlines(conn: &Connection, sql: &str, params: impl Params) -> RepoResult<Vec<Deadline>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut deadlines = Vec::new();

    while let Some(row) = rows.next()? {
        match parse_deadline_row(row) {
            Ok(deadline) => deadlines.push(deadline),
            Err(RepoError::InvalidData(message)) => {
                warn!("event=deadline_row_skipped module=repo status=error error={message}");
            }
            Err(other) => return Err(other),
        }
    }

    Ok(deadlines)
}

fn parse_deadline_row(row: &Row<'_>) -> RepoResult<Deadline> {
    let id: DeadlineId = row.get("id")?;

    let priority_value: i64 = row.get("priority")?;
    let priority = Priority::try_from(priority_value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_value}` in deadlines.priority (id {id})"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = DeadlineStatus::from_label(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in deadlines.status (id {id})"
        ))
    })?;

    let completed_at = match row.get::<_, Option<String>>("completed_at")? {
        Some(value) if !value.is_empty() => Some(decode_timestamp(&value, "completed_at", id)?),
        _ => None,
    };

    Ok(Deadline {
        id,
        title: row.get("title")?,
        description: row.get::<_, Option<String>>("description")?.unwrap_or_default(),
        due_date: decode_timestamp(&row.get::<_, String>("due_date")?, "due_date", id)?,
        priority,
        status,
        category: row.get("category")?,
        created_at: decode_timestamp(&row.get::<_, String>("created_at")?, "created_at", id)?,
        completed_at,
    })
}

fn encode_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_WRITE_FORMAT).to_string()
}

fn decode_timestamp(value: &str, column: &str, id: DeadlineId) -> RepoResult<NaiveDateTime> {
    TIMESTAMP_READ_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid timestamp `{value}` in deadlines.{column} (id {id})"
            ))
        })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "deadlines")? {
        return Err(RepoError::MissingRequiredTable("deadlines"));
    }

    for column in DEADLINE_COLUMNS {
        if !table_has_column(conn, "deadlines", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "deadlines",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{decode_timestamp, encode_timestamp, RepoError, LATEST_TIMESTAMP};
    use chrono::NaiveDate;

    #[test]
    fn timestamps_are_fixed_width_and_accept_legacy_forms() {
        let at = NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let encoded = encode_timestamp(at);
        assert_eq!(encoded, "2026-01-02T03:04:05.000000");
        assert_eq!(decode_timestamp(&encoded, "due_date", 1).unwrap(), at);
        assert_eq!(
            decode_timestamp("2026-01-02T03:04:05", "due_date", 1).unwrap(),
            at
        );
        assert_eq!(
            decode_timestamp("2026-01-02 03:04:05", "due_date", 1).unwrap(),
            at
        );
    }

    #[test]
    fn undecodable_timestamp_is_invalid_data() {
        let err = decode_timestamp("next tuesday", "due_date", 7).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("id 7")));
    }

    #[test]
    fn latest_timestamp_matches_encoding_of_last_storable_instant() {
        let last = NaiveDate::from_ymd_opt(9999, 12, 31)
            .unwrap()
            .and_hms_micro_opt(23, 59, 59, 999_999)
            .unwrap();
        assert_eq!(encode_timestamp(last), LATEST_TIMESTAMP);
    }
}
