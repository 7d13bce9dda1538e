//! Deadline use-case service.
//!
//! # Responsibility
//! - Accept raw caller input (priority levels, status names) and validate it.
//! - Delegate persistence to a `DeadlineStore`.
//! - Seed demonstration data.
//!
//! # Invariants
//! - Validation failures never touch storage.

use crate::model::deadline::{Deadline, DeadlineId, DeadlineStatus, NewDeadline, Priority};
use crate::repo::deadline_repo::{DeadlineStore, RepoResult};
use chrono::Duration;
use log::info;

/// Use-case wrapper around a deadline store.
pub struct DeadlineService<S: DeadlineStore> {
    store: S,
}

impl<S: DeadlineStore> DeadlineService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store, for queries that need no validation.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates and inserts a deadline.
    ///
    /// # Errors
    /// - `RepoError::Validation` for an empty title or category.
    pub fn create_deadline(&self, deadline: &NewDeadline) -> RepoResult<DeadlineId> {
        deadline.validate()?;
        self.store.add(deadline)
    }

    /// Loads a deadline by id.
    pub fn get_deadline(&self, id: DeadlineId) -> RepoResult<Option<Deadline>> {
        self.store.get(id)
    }

    /// Sets the priority from a raw ordinal.
    ///
    /// Levels outside 1..=4 fail with `RepoError::Validation` and leave the
    /// stored priority unchanged. Returns `false` for an unknown id.
    pub fn update_priority_level(&self, id: DeadlineId, level: i64) -> RepoResult<bool> {
        let priority = Priority::try_from(level)?;
        self.store.update_priority(id, priority)
    }

    /// Sets the status from a user-typed name such as `in progress`.
    pub fn update_status_named(&self, id: DeadlineId, status: &str) -> RepoResult<bool> {
        let status = status.parse::<DeadlineStatus>()?;
        self.store.update_status(id, status)
    }

    /// Inserts the demonstration deadlines, due relative to the store clock.
    pub fn seed_samples(&self) -> RepoResult<Vec<DeadlineId>> {
        let now = self.store.now();
        let ids = sample_deadlines()
            .into_iter()
            .map(|(title, days, priority, category)| {
                let deadline =
                    NewDeadline::new(title, now + Duration::days(days), priority, category);
                self.store.add(&deadline)
            })
            .collect::<RepoResult<Vec<_>>>()?;

        info!(
            "event=deadline_seed module=service status=ok count={}",
            ids.len()
        );
        Ok(ids)
    }
}

fn sample_deadlines() -> [(&'static str, i64, Priority, &'static str); 6] {
    [
        ("Complete Project Proposal", 2, Priority::High, "Work"),
        ("Study for Math Exam", 5, Priority::Urgent, "Education"),
        ("Pay Electricity Bill", 1, Priority::Medium, "Personal"),
        ("Doctor Appointment", 7, Priority::Low, "Health"),
        ("Team Meeting", 3, Priority::Medium, "Work"),
        ("Birthday Party", 10, Priority::Low, "Personal"),
    ]
}
