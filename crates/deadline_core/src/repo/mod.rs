//! Persistence contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the deadline store contract used by services and the CLI.
//! - Keep SQL and row encoding inside the repository boundary.
//!
//! # Invariants
//! - Not-found is reported as `Ok(false)` / `Ok(None)`, never as an error.
//! - Storage faults surface as `RepoError::Db` and are logged where they occur.

pub mod deadline_repo;
