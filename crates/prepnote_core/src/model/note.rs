//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted shape of a (possibly encrypted) note.
//! - Carry the optional plaintext security hint.
//!
//! # Invariants
//! - `id` is generated once and never reused.
//! - `title` is always plaintext.
//! - `is_encrypted` is fixed at creation; when true `content` is codec
//!   ciphertext and the password is never stored anywhere.
//! - `created_at <= updated_at`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::ValidationError;

/// Stable identifier for notes and vault items.
pub type RecordId = Uuid;

/// Human fallback hint stored next to a protected record.
///
/// Stored in plaintext. This is a UX affordance only: anyone who can read
/// the storage medium can read both fields, so it carries no
/// confidentiality guarantee and is never used as a decryption factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityData {
    pub question: String,
    pub answer: String,
}

impl SecurityData {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Both fields must be non-blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.question.trim().is_empty() || self.answer.trim().is_empty() {
            return Err(ValidationError::IncompleteSecurityData);
        }
        Ok(())
    }
}

/// Persisted note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: RecordId,
    pub title: String,
    /// Plaintext, or codec ciphertext when `is_encrypted`.
    pub content: String,
    pub is_encrypted: bool,
    pub security_data: Option<SecurityData>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Strictly increases on every update.
    pub updated_at: i64,
}

impl NoteRecord {
    /// Builds a new record with a generated id and `created_at == updated_at`.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        is_encrypted: bool,
        security_data: Option<SecurityData>,
        now_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            is_encrypted,
            security_data,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}

/// Partial update for title and/or content.
///
/// `is_encrypted` is deliberately absent: it cannot change after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NoteUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: None,
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(content.into()),
        }
    }
}
