//! Core domain logic for the deadline tracker.
//! This crate owns deadline persistence, overdue escalation and notification
//! summaries. Presentation lives in `deadline_cli`.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::deadline::{
    Deadline, DeadlineId, DeadlineStatus, DeadlineValidationError, NewDeadline, Priority,
    DUE_YEAR_RANGE,
};
pub use repo::deadline_repo::{DeadlineStore, RepoError, RepoResult, SqliteDeadlineStore};
pub use service::deadline_service::DeadlineService;
pub use service::notification_service::{
    NotificationEngine, NotificationReport, DEFAULT_NOTIFY_DAYS,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
