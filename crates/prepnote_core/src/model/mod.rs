//! Domain model for notes and vault items.
//!
//! # Responsibility
//! - Define the records persisted by the note and vault stores.
//! - Centralize user-input validation rules.
//!
//! # Invariants
//! - Every record is identified by a stable `RecordId`.
//! - Deletion is immediate; there are no tombstones.

pub mod note;
pub mod validation;
pub mod vault_item;
