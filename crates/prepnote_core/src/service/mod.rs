//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the store APIs used by the UI.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod note_service;
pub mod secure_note;
pub mod vault_service;
