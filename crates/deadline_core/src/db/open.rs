//! Connection bootstrap for file and in-memory databases.
//!
//! Both entry points configure the connection and run migrations before
//! handing it out, so callers treat a returned connection as initialized.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const IN_MEMORY_LOCATION: &str = ":memory:";

/// Opens (creating if needed) a database file and applies pending migrations.
///
/// Safe to call on every startup. Fails when the file cannot be opened or the
/// schema was written by a newer binary.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    initialize("file", &path.display().to_string(), || Connection::open(path))
}

/// Opens a private in-memory database with the full schema applied.
pub fn open_db_in_memory() -> DbResult<Connection> {
    initialize("memory", IN_MEMORY_LOCATION, Connection::open_in_memory)
}

fn initialize(
    mode: &'static str,
    location: &str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let result = connect()
        .map_err(|source| DbError::Open {
            location: location.to_string(),
            source,
        })
        .and_then(|mut conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            apply_migrations(&mut conn)?;
            Ok(conn)
        });

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={mode} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
    }
    result
}
