//! Note store use-case service.
//!
//! # Responsibility
//! - Provide add/update/delete/list over the note collection.
//! - Validate user input before it reaches persistence.
//!
//! # Invariants
//! - The service never encrypts; encrypted notes arrive as ciphertext.
//! - `update` never touches `id`, `created_at` or `is_encrypted`.
//! - `update` always advances `updated_at`.

use crate::codec::CodecError;
use crate::model::note::{NoteRecord, NoteUpdate, RecordId, SecurityData};
use crate::model::validation::{normalize_title, ValidationError};
use crate::repo::note_repo::NoteRepository;
use crate::repo::{now_epoch_ms, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Caller input was rejected.
    Validation(ValidationError),
    /// Target note does not exist.
    NotFound(RecordId),
    /// Password did not open the note (or the ciphertext is corrupt).
    IncorrectPassword,
    /// Codec failure other than authentication.
    Codec(CodecError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::IncorrectPassword => write!(f, "incorrect password"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for NoteServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CodecError> for NoteServiceError {
    fn from(value: CodecError) -> Self {
        match value {
            CodecError::AuthenticationFailed => Self::IncorrectPassword,
            other => Self::Codec(other),
        }
    }
}

/// Note store facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds a note. `content` must already be ciphertext when `is_encrypted`.
    pub fn add(
        &self,
        title: &str,
        content: impl Into<String>,
        is_encrypted: bool,
        security_data: Option<SecurityData>,
    ) -> Result<NoteRecord, NoteServiceError> {
        let title = normalize_title(title)?;
        if let Some(data) = security_data.as_ref() {
            data.validate()?;
        }

        let note = NoteRecord::new(title, content, is_encrypted, security_data, now_epoch_ms());
        self.repo.insert_note(&note)?;
        info!(
            "event=note_add module=notes status=ok encrypted={} has_security_data={}",
            note.is_encrypted,
            note.security_data.is_some()
        );
        Ok(note)
    }

    /// Replaces title and/or content and refreshes `updated_at`.
    ///
    /// For encrypted notes the caller passes new ciphertext produced under
    /// the note's original password.
    pub fn update(&self, id: RecordId, update: NoteUpdate) -> Result<NoteRecord, NoteServiceError> {
        let title = update.title.as_deref().map(normalize_title).transpose()?;
        let result = self.repo.update_note(
            id,
            title.as_deref(),
            update.content.as_deref(),
            now_epoch_ms(),
        );
        if let Err(RepoError::NotFound(_)) = &result {
            warn!("event=note_update module=notes status=error reason=not_found");
        }
        result?;

        self.repo
            .get_note(id)?
            .ok_or(NoteServiceError::InconsistentState(
                "updated note not found in read-back",
            ))
    }

    /// Removes a note immediately. There is no undo.
    pub fn delete(&self, id: RecordId) -> Result<(), NoteServiceError> {
        self.repo.delete_note(id)?;
        info!("event=note_delete module=notes status=ok");
        Ok(())
    }

    pub fn get(&self, id: RecordId) -> Result<NoteRecord, NoteServiceError> {
        self.repo
            .get_note(id)?
            .ok_or(NoteServiceError::NotFound(id))
    }

    /// Returns a snapshot of all notes in insertion order.
    pub fn list(&self) -> Result<Vec<NoteRecord>, NoteServiceError> {
        Ok(self.repo.list_notes()?)
    }

    /// Returns all notes sorted by `updated_at DESC, id ASC`.
    pub fn list_recent(&self) -> Result<Vec<NoteRecord>, NoteServiceError> {
        let mut notes = self.list()?;
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(notes)
    }
}
