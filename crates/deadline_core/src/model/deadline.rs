//! Deadline record, priority and status types.
//!
//! # Responsibility
//! - Define the canonical deadline record shared by store, engine and CLI.
//! - Map priority/status enums to their display names and raw encodings.
//!
//! # Invariants
//! - `Priority` ordinals are exactly 1..=4.
//! - `DeadlineStatus` labels are exactly `Pending`, `In Progress`,
//!   `Completed` and `Overdue`.
//! - Stored due dates have four-digit years, so their text encoding sorts
//!   in time order.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Store-assigned row id.
pub type DeadlineId = i64;

/// Years a due date may fall in.
pub const DUE_YEAR_RANGE: RangeInclusive<i32> = 0..=9999;

const SECONDS_PER_DAY: i64 = 86_400;

/// Urgency ordinal stored as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
    Urgent = 4,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    /// Raw ordinal persisted in `deadlines.priority`.
    pub fn level(self) -> i64 {
        self as i64
    }

    /// Upper-case display name (`LOW`, `MEDIUM`, `HIGH`, `URGENT`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }

    /// HIGH and URGENT deadlines are flagged in notifications.
    pub fn is_high(self) -> bool {
        self >= Self::High
    }
}

impl TryFrom<i64> for Priority {
    type Error = DeadlineValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            4 => Ok(Self::Urgent),
            other => Err(DeadlineValidationError::InvalidPriority(other)),
        }
    }
}

impl From<Priority> for i64 {
    fn from(value: Priority) -> Self {
        value.level()
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

/// Accepts either the ordinal (`"3"`) or the name (`"high"`).
impl FromStr for Priority {
    type Err = DeadlineValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Ok(level) = trimmed.parse::<i64>() {
            return Self::try_from(level);
        }
        Self::ALL
            .into_iter()
            .find(|priority| priority.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| DeadlineValidationError::UnknownPriority(trimmed.to_string()))
    }
}

/// Lifecycle state stored as its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeadlineStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Overdue,
}

impl DeadlineStatus {
    pub const ALL: [DeadlineStatus; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Overdue,
    ];

    /// Label persisted in `deadlines.status`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Overdue => "Overdue",
        }
    }

    /// Exact-match decode of a persisted label.
    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.label() == value)
    }
}

impl Display for DeadlineStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Lenient parse for user input: case-insensitive, `_`/`-` read as spaces.
impl FromStr for DeadlineStatus {
    type Err = DeadlineValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| DeadlineValidationError::UnknownStatus(value.trim().to_string()))
    }
}

/// Persisted deadline record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    pub id: DeadlineId,
    pub title: String,
    /// Empty when the caller gave no description.
    pub description: String,
    pub due_date: NaiveDateTime,
    pub priority: Priority,
    pub status: DeadlineStatus,
    pub category: String,
    pub created_at: NaiveDateTime,
    /// Present only while `status == Completed`.
    pub completed_at: Option<NaiveDateTime>,
}

impl Deadline {
    pub fn is_completed(&self) -> bool {
        self.status == DeadlineStatus::Completed
    }

    /// Days from `now` until the due date, rounded down; negative once past
    /// due, so a deadline twelve hours late is `-1`.
    pub fn days_until(&self, now: NaiveDateTime) -> i64 {
        (self.due_date - now)
            .num_seconds()
            .div_euclid(SECONDS_PER_DAY)
    }

    /// Whole days the deadline is past due at `now`, or 0 if not yet due.
    pub fn days_overdue(&self, now: NaiveDateTime) -> i64 {
        (now - self.due_date)
            .num_seconds()
            .div_euclid(SECONDS_PER_DAY)
            .max(0)
    }
}

/// Create request for a deadline; the store assigns id, status and
/// timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeadline {
    pub title: String,
    pub description: String,
    pub due_date: NaiveDateTime,
    pub priority: Priority,
    pub category: String,
}

impl NewDeadline {
    pub fn new(
        title: impl Into<String>,
        due_date: NaiveDateTime,
        priority: Priority,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            due_date,
            priority,
            category: category.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Checks caller-level constraints. The store itself does not call this.
    pub fn validate(&self) -> Result<(), DeadlineValidationError> {
        if self.title.trim().is_empty() {
            return Err(DeadlineValidationError::EmptyTitle);
        }
        if self.category.trim().is_empty() {
            return Err(DeadlineValidationError::EmptyCategory);
        }
        check_due_date(self.due_date)
    }
}

/// Rejects due dates whose year falls outside `DUE_YEAR_RANGE`.
pub fn check_due_date(due_date: NaiveDateTime) -> Result<(), DeadlineValidationError> {
    if DUE_YEAR_RANGE.contains(&due_date.year()) {
        Ok(())
    } else {
        Err(DeadlineValidationError::DueDateOutOfRange(due_date))
    }
}

/// Invalid user-supplied deadline input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadlineValidationError {
    EmptyTitle,
    EmptyCategory,
    InvalidPriority(i64),
    DueDateOutOfRange(NaiveDateTime),
    UnknownPriority(String),
    UnknownStatus(String),
}

impl Display for DeadlineValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title cannot be empty"),
            Self::EmptyCategory => write!(f, "category cannot be empty"),
            Self::InvalidPriority(level) => {
                write!(f, "priority must be between 1 and 4, got {level}")
            }
            Self::DueDateOutOfRange(due_date) => write!(
                f,
                "due date {due_date} is outside years {}..={}",
                DUE_YEAR_RANGE.start(),
                DUE_YEAR_RANGE.end()
            ),
            Self::UnknownPriority(value) => write!(f, "unknown priority `{value}`"),
            Self::UnknownStatus(value) => write!(f, "unknown status `{value}`"),
        }
    }
}

impl Error for DeadlineValidationError {}
