//! Core domain logic for PrepNote.
//! This crate is the single source of truth for the secure-note codec,
//! the note store and the vault unlock state machine.

pub mod codec;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use codec::{CodecError, KdfParams, SecureContentCodec};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{NoteRecord, NoteUpdate, RecordId, SecurityData};
pub use model::validation::{ValidationError, MIN_MASTER_PASSWORD_CHARS};
pub use model::vault_item::{VaultItemRecord, VaultItemUpdate};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
pub use repo::vault_repo::{SqliteVaultRepository, VaultRepository};
pub use repo::{RepoError, RepoResult};
pub use service::note_service::{NoteService, NoteServiceError};
pub use service::secure_note::{add_secure_note, edit_secure_note, reveal_note};
pub use service::vault_service::{VaultError, VaultService, VaultSession, VaultState};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
