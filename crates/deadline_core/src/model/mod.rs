//! Deadline domain model.
//!
//! # Invariants
//! - Every deadline is identified by a store-assigned integer id.
//! - `completed_at` is set iff `status == Completed`.
//! - Deletion is permanent; there are no tombstones.

pub mod deadline;
