//! Use-case services over the deadline store.
//!
//! # Responsibility
//! - Validate raw caller input before it reaches storage.
//! - Derive notification summaries without persisting anything of their own.

pub mod deadline_service;
pub mod notification_service;
