//! Notification summary over the deadline store.
//!
//! # Responsibility
//! - Bucket deadlines into "overdue" and "upcoming within N days".
//! - Leave rendering (icons, grouping, wording) to the caller.
//!
//! # Invariants
//! - `check` escalates newly overdue deadlines through
//!   `DeadlineStore::list_overdue`; it writes nothing else.

use crate::model::deadline::Deadline;
use crate::repo::deadline_repo::{DeadlineStore, RepoResult};
use chrono::NaiveDateTime;
use log::info;

/// Look-ahead used when the caller does not choose one.
pub const DEFAULT_NOTIFY_DAYS: u32 = 3;

/// Point-in-time attention summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationReport {
    pub checked_at: NaiveDateTime,
    pub days_ahead: u32,
    /// Deadlines escalated to `Overdue` by this check, by due date.
    pub overdue: Vec<Deadline>,
    /// Non-completed deadlines due within `days_ahead`, by due date.
    pub upcoming: Vec<Deadline>,
}

impl NotificationReport {
    /// No overdue and no upcoming deadlines: nothing needs attention.
    pub fn is_all_clear(&self) -> bool {
        self.overdue.is_empty() && self.upcoming.is_empty()
    }

    pub fn days_overdue(&self, deadline: &Deadline) -> i64 {
        deadline.days_overdue(self.checked_at)
    }

    pub fn days_until(&self, deadline: &Deadline) -> i64 {
        deadline.days_until(self.checked_at)
    }

    /// Upcoming deadlines with HIGH or URGENT priority.
    pub fn urgent_upcoming(&self) -> impl Iterator<Item = &Deadline> {
        self.upcoming
            .iter()
            .filter(|deadline| deadline.priority.is_high())
    }
}

/// Derives notification reports from a deadline store.
pub struct NotificationEngine<S: DeadlineStore> {
    store: S,
}

impl<S: DeadlineStore> NotificationEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Builds a report of overdue deadlines and those due within
    /// `days_ahead` days.
    pub fn check(&self, days_ahead: u32) -> RepoResult<NotificationReport> {
        let checked_at = self.store.now();
        let overdue = self.store.list_overdue()?;
        let upcoming = self.store.list_upcoming(days_ahead)?;

        info!(
            "event=notification_check module=service status=ok days_ahead={days_ahead} overdue={} upcoming={}",
            overdue.len(),
            upcoming.len()
        );

        Ok(NotificationReport {
            checked_at,
            days_ahead,
            overdue,
            upcoming,
        })
    }
}
