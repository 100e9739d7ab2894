//! Call-site composition of the codec with the note store.
//!
//! The note store accepts only ciphertext for encrypted notes; these
//! helpers do the encrypt/decrypt step around it so UI code does not
//! repeat it.

use crate::codec::SecureContentCodec;
use crate::model::note::{NoteRecord, NoteUpdate, RecordId, SecurityData};
use crate::model::validation::{normalize_title, require_password};
use crate::repo::note_repo::NoteRepository;
use crate::service::note_service::{NoteService, NoteServiceError};

/// Encrypts `plaintext` under `password` and stores it as a new note.
///
/// The password is not stored. `security_data` is stored in plaintext and
/// is only a reminder for the user; it cannot decrypt anything.
pub fn add_secure_note<R: NoteRepository>(
    notes: &NoteService<R>,
    codec: &SecureContentCodec,
    title: &str,
    plaintext: &str,
    password: &str,
    security_data: Option<SecurityData>,
) -> Result<NoteRecord, NoteServiceError> {
    require_password(password)?;
    // Fail cheap input errors before paying for key derivation.
    normalize_title(title)?;
    if let Some(data) = security_data.as_ref() {
        data.validate()?;
    }

    let ciphertext = codec.encrypt(plaintext, password)?;
    notes.add(title, ciphertext, true, security_data)
}

/// Returns the plaintext body of a note.
///
/// Plain notes are returned as-is and `password` is ignored.
pub fn reveal_note<R: NoteRepository>(
    notes: &NoteService<R>,
    codec: &SecureContentCodec,
    id: RecordId,
    password: &str,
) -> Result<String, NoteServiceError> {
    let note = notes.get(id)?;
    if !note.is_encrypted {
        return Ok(note.content);
    }
    Ok(codec.decrypt(&note.content, password)?)
}

/// Edits a note, re-encrypting new content under the note's own password.
///
/// For encrypted notes `password` must open the current ciphertext first,
/// so the note can never end up under a different password. Plain notes
/// are updated directly.
pub fn edit_secure_note<R: NoteRepository>(
    notes: &NoteService<R>,
    codec: &SecureContentCodec,
    id: RecordId,
    update: NoteUpdate,
    password: &str,
) -> Result<NoteRecord, NoteServiceError> {
    let note = notes.get(id)?;
    if !note.is_encrypted {
        return notes.update(id, update);
    }

    require_password(password)?;
    codec.decrypt(&note.content, password)?;
    let content = update
        .content
        .map(|plaintext| codec.encrypt(&plaintext, password))
        .transpose()?;
    notes.update(
        id,
        NoteUpdate {
            title: update.title,
            content,
        },
    )
}
