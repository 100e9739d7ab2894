//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose note store, secure-note and vault operations to Dart via FRB.
//! - Own the process-wide vault session (volatile unlock state).
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every failure is returned as an envelope with `ok=false` and a
//!   user-presentable message.
//! - Passwords received here are never logged or persisted.

use log::warn;
use once_cell::sync::{Lazy, OnceCell};
use prepnote_core::db::open_db;
use prepnote_core::{
    add_secure_note as add_secure_note_inner, core_version as core_version_inner,
    edit_secure_note, init_logging as init_logging_inner, ping as ping_inner, reveal_note,
    NoteRecord, NoteService, NoteUpdate, SecureContentCodec, SecurityData, SqliteNoteRepository,
    SqliteVaultRepository, VaultItemRecord, VaultItemUpdate, VaultService, VaultSession,
};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const DB_FILE_NAME: &str = "prepnote.sqlite3";
const DB_PATH_ENV: &str = "PREPNOTE_DB_PATH";

static DB_PATH: OnceCell<PathBuf> = OnceCell::new();
static VAULT_SESSION: Lazy<Mutex<VaultSession>> = Lazy::new(|| Mutex::new(VaultSession::new()));

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Fixes the database file used by every later call.
///
/// # FFI contract
/// - Call once at startup with a path inside the app documents dir.
/// - Repeating with the same path is a no-op; a different path is rejected.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_storage(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = DB_PATH.get_or_init(|| requested.clone());
    if *active != requested {
        return format!(
            "storage already initialized at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        );
    }
    String::new()
}

/// Note projection returned to Dart.
///
/// Encrypted notes carry ciphertext in `content`; call `note_reveal` for
/// plaintext. The security answer is not exposed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub is_encrypted: bool,
    pub security_question: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Vault item projection returned to Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub security_question: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected record ID, when there is one.
    pub record_id: Option<String>,
    /// Human-readable response message for UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, record_id: Option<String>) -> Self {
        Self {
            ok: true,
            record_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            record_id: None,
            message: message.into(),
        }
    }
}

/// Text payload envelope (revealed content, codec output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResponse {
    pub ok: bool,
    pub text: String,
    pub message: String,
}

impl TextResponse {
    fn from_result<E: std::fmt::Display>(result: Result<String, E>) -> Self {
        match result {
            Ok(text) => Self {
                ok: true,
                text,
                message: String::new(),
            },
            Err(err) => Self {
                ok: false,
                text: String::new(),
                message: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListResponse {
    pub ok: bool,
    pub items: Vec<NoteItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultItemListResponse {
    pub ok: bool,
    pub items: Vec<VaultItem>,
    pub message: String,
}

/// Adds a plain note.
#[flutter_rust_bridge::frb(sync)]
pub fn note_add(title: String, content: String) -> ActionResponse {
    record_action("Note saved.", "note_add", |conn| {
        let notes = note_service(conn)?;
        let note = notes
            .add(&title, content, false, None)
            .map_err(|err| err.to_string())?;
        Ok(Some(note.id))
    })
}

/// Encrypts `content` under `password` and stores it as a new note.
///
/// `security_question`/`security_answer` are optional and must be given
/// together. They are stored unencrypted.
#[flutter_rust_bridge::frb(sync)]
pub fn note_add_secure(
    title: String,
    content: String,
    password: String,
    security_question: Option<String>,
    security_answer: Option<String>,
) -> ActionResponse {
    record_action("Secure note saved.", "note_add_secure", |conn| {
        let notes = note_service(conn)?;
        let security_data = security_data_from(security_question, security_answer)?;
        let note = add_secure_note_inner(
            &notes,
            &SecureContentCodec::default(),
            &title,
            &content,
            &password,
            security_data,
        )
        .map_err(|err| err.to_string())?;
        Ok(Some(note.id))
    })
}

/// Updates title and/or content of a note.
///
/// For encrypted notes `password` must be the note's password; new
/// content is re-encrypted under it. Plain notes ignore `password`.
#[flutter_rust_bridge::frb(sync)]
pub fn note_update(
    note_id: String,
    title: Option<String>,
    content: Option<String>,
    password: Option<String>,
) -> ActionResponse {
    record_action("Note updated.", "note_update", |conn| {
        let id = parse_id(&note_id)?;
        let notes = note_service(conn)?;
        let note = edit_secure_note(
            &notes,
            &SecureContentCodec::default(),
            id,
            NoteUpdate { title, content },
            password.as_deref().unwrap_or_default(),
        )
        .map_err(|err| err.to_string())?;
        Ok(Some(note.id))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(note_id: String) -> ActionResponse {
    record_action("Note deleted.", "note_delete", |conn| {
        let id = parse_id(&note_id)?;
        note_service(conn)?
            .delete(id)
            .map_err(|err| err.to_string())?;
        Ok(Some(id))
    })
}

/// Lists notes, most recently updated first.
#[flutter_rust_bridge::frb(sync)]
pub fn note_list() -> NoteListResponse {
    let result = with_connection(|conn| {
        note_service(conn)?
            .list_recent()
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(notes) => NoteListResponse {
            ok: true,
            items: notes.into_iter().map(to_note_item).collect(),
            message: String::new(),
        },
        Err(message) => NoteListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

/// Returns a note's plaintext content.
#[flutter_rust_bridge::frb(sync)]
pub fn note_reveal(note_id: String, password: String) -> TextResponse {
    TextResponse::from_result(with_connection(|conn| {
        let id = parse_id(&note_id)?;
        let notes = note_service(conn)?;
        reveal_note(&notes, &SecureContentCodec::default(), id, &password)
            .map_err(|err| err.to_string())
    }))
}

/// Encrypts arbitrary text without storing it.
#[flutter_rust_bridge::frb(sync)]
pub fn content_encrypt(plaintext: String, password: String) -> TextResponse {
    if password.is_empty() {
        return TextResponse::from_result(Err("password cannot be empty"));
    }
    TextResponse::from_result(SecureContentCodec::default().encrypt(&plaintext, &password))
}

/// Decrypts text produced by `content_encrypt`.
#[flutter_rust_bridge::frb(sync)]
pub fn content_decrypt(ciphertext: String, password: String) -> TextResponse {
    TextResponse::from_result(SecureContentCodec::default().decrypt(&ciphertext, &password))
}

/// Current vault state: `no_setup`, `locked` or `unlocked`.
///
/// Returns `error: <message>` when storage is unavailable.
#[flutter_rust_bridge::frb(sync)]
pub fn vault_state() -> String {
    match with_vault(|vault| vault.state().map_err(|err| err.to_string())) {
        Ok(state) => state.as_str().to_string(),
        Err(message) => format!("error: {message}"),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn vault_setup(password: String, confirm_password: String) -> ActionResponse {
    vault_action("Vault created.", |vault| {
        vault
            .setup_vault(&password, &confirm_password)
            .map_err(|err| err.to_string())?;
        Ok(None)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn vault_unlock(password: String) -> ActionResponse {
    vault_action("Vault unlocked.", |vault| {
        vault.unlock(&password).map_err(|err| err.to_string())?;
        Ok(None)
    })
}

/// Locks the vault. Never fails.
#[flutter_rust_bridge::frb(sync)]
pub fn vault_lock() -> ActionResponse {
    lock_session().lock();
    ActionResponse::success("Vault locked.", None)
}

#[flutter_rust_bridge::frb(sync)]
pub fn vault_item_add(
    title: String,
    content: String,
    security_question: Option<String>,
    security_answer: Option<String>,
) -> ActionResponse {
    vault_action("Vault item saved.", |vault| {
        let security_data = security_data_from(security_question, security_answer)?;
        let item = vault
            .add_item(&title, &content, security_data)
            .map_err(|err| err.to_string())?;
        Ok(Some(item.id))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn vault_item_update(
    item_id: String,
    title: Option<String>,
    content: Option<String>,
) -> ActionResponse {
    vault_action("Vault item updated.", |vault| {
        let id = parse_id(&item_id)?;
        let item = vault
            .update_item(id, VaultItemUpdate { title, content })
            .map_err(|err| err.to_string())?;
        Ok(Some(item.id))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn vault_item_delete(item_id: String) -> ActionResponse {
    vault_action("Vault item deleted.", |vault| {
        let id = parse_id(&item_id)?;
        vault.delete_item(id).map_err(|err| err.to_string())?;
        Ok(Some(id))
    })
}

/// Lists vault items with plaintext content. Fails while locked.
#[flutter_rust_bridge::frb(sync)]
pub fn vault_item_list() -> VaultItemListResponse {
    match with_vault(|vault| vault.list_items().map_err(|err| err.to_string())) {
        Ok(items) => VaultItemListResponse {
            ok: true,
            items: items.into_iter().map(to_vault_item).collect(),
            message: String::new(),
        },
        Err(message) => VaultItemListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_connection<T>(f: impl FnOnce(&Connection) -> Result<T, String>) -> Result<T, String> {
    let conn =
        open_db(resolve_db_path()).map_err(|err| format!("storage open failed: {err}"))?;
    f(&conn)
}

fn lock_session() -> MutexGuard<'static, VaultSession> {
    // A panic while holding the guard cannot leave the session half-written.
    VAULT_SESSION
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn with_vault<T>(
    f: impl FnOnce(&mut VaultService<'_, SqliteVaultRepository<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    with_connection(|conn| {
        let repo = SqliteVaultRepository::try_new(conn)
            .map_err(|err| format!("vault repo init failed: {err}"))?;
        let mut session = lock_session();
        let mut vault = VaultService::new(repo, &mut session);
        f(&mut vault)
    })
}

fn note_service(conn: &Connection) -> Result<NoteService<SqliteNoteRepository<'_>>, String> {
    let repo = SqliteNoteRepository::try_new(conn)
        .map_err(|err| format!("note repo init failed: {err}"))?;
    Ok(NoteService::new(repo))
}

fn record_action(
    success_message: &str,
    op: &'static str,
    f: impl FnOnce(&Connection) -> Result<Option<Uuid>, String>,
) -> ActionResponse {
    match with_connection(f) {
        Ok(id) => ActionResponse::success(success_message, id.map(|id| id.to_string())),
        Err(message) => {
            warn!("event={op} module=ffi status=error");
            ActionResponse::failure(message)
        }
    }
}

fn vault_action(
    success_message: &str,
    f: impl FnOnce(&mut VaultService<'_, SqliteVaultRepository<'_>>) -> Result<Option<Uuid>, String>,
) -> ActionResponse {
    match with_vault(f) {
        Ok(id) => ActionResponse::success(success_message, id.map(|id| id.to_string())),
        Err(message) => ActionResponse::failure(message),
    }
}

fn parse_id(value: &str) -> Result<Uuid, String> {
    Uuid::parse_str(value.trim()).map_err(|_| format!("invalid record id `{value}`"))
}

fn security_data_from(
    question: Option<String>,
    answer: Option<String>,
) -> Result<Option<SecurityData>, String> {
    match (question, answer) {
        (None, None) => Ok(None),
        (Some(question), Some(answer)) => Ok(Some(SecurityData::new(question, answer))),
        _ => Err("security question and answer must both be provided".to_string()),
    }
}

fn to_note_item(note: NoteRecord) -> NoteItem {
    NoteItem {
        id: note.id.to_string(),
        title: note.title,
        content: note.content,
        is_encrypted: note.is_encrypted,
        security_question: note.security_data.map(|data| data.question),
        created_at: note.created_at,
        updated_at: note.updated_at,
    }
}

fn to_vault_item(item: VaultItemRecord) -> VaultItem {
    VaultItem {
        id: item.id.to_string(),
        title: item.title,
        content: item.content,
        security_question: item.security_data.map(|data| data.question),
        created_at: item.created_at,
        updated_at: item.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        content_decrypt, content_encrypt, core_version, init_logging, init_storage, note_add,
        note_add_secure, note_delete, note_list, note_reveal, note_update, ping, vault_item_add,
        vault_item_delete, vault_item_list, vault_lock, vault_setup, vault_state, vault_unlock,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    fn init_test_storage() {
        let path = std::env::temp_dir().join(format!(
            "prepnote-ffi-test-{}.sqlite3",
            std::process::id()
        ));
        let error = init_storage(path.to_string_lossy().into_owned());
        assert!(error.is_empty(), "{error}");
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_storage_rejects_empty_and_conflicting_paths() {
        init_test_storage();
        assert!(!init_storage("  ".to_string()).is_empty());
        assert!(init_storage("/somewhere/else.sqlite3".to_string()).contains("refusing"));
    }

    #[test]
    fn note_add_then_list_contains_note() {
        init_test_storage();
        let title = unique_token("ffi-note");
        let created = note_add(title.clone(), "1234-5678".to_string());
        assert!(created.ok, "{}", created.message);
        let id = created.record_id.expect("note add should return id");

        let listed = note_list();
        assert!(listed.ok, "{}", listed.message);
        let item = listed
            .items
            .iter()
            .find(|item| item.id == id)
            .expect("created note listed");
        assert_eq!(item.title, title);
        assert_eq!(item.content, "1234-5678");

        assert!(note_delete(id.clone()).ok);
        let second = note_delete(id);
        assert!(!second.ok);
        assert!(second.message.contains("not found"));
    }

    #[test]
    fn secure_note_reveal_and_update_require_password() {
        init_test_storage();
        let created = note_add_secure(
            unique_token("ffi-secure"),
            "my ssn is 123".to_string(),
            "pw".to_string(),
            Some("Pet?".to_string()),
            Some("Rex".to_string()),
        );
        assert!(created.ok, "{}", created.message);
        let id = created.record_id.expect("secure note id");

        let wrong = note_reveal(id.clone(), "nope".to_string());
        assert!(!wrong.ok);
        assert!(wrong.text.is_empty());

        let updated = note_update(id.clone(), None, Some("new".to_string()), Some("pw".to_string()));
        assert!(updated.ok, "{}", updated.message);
        let revealed = note_reveal(id, "pw".to_string());
        assert!(revealed.ok, "{}", revealed.message);
        assert_eq!(revealed.text, "new");
    }

    #[test]
    fn half_filled_security_data_is_rejected() {
        init_test_storage();
        let response = note_add_secure(
            "t".to_string(),
            "c".to_string(),
            "pw".to_string(),
            Some("Pet?".to_string()),
            None,
        );
        assert!(!response.ok);
    }

    #[test]
    fn content_codec_round_trip_and_failure_envelope() {
        let sealed = content_encrypt("hello".to_string(), "pw".to_string());
        assert!(sealed.ok);
        assert_eq!(
            content_decrypt(sealed.text.clone(), "pw".to_string()).text,
            "hello"
        );
        let failed = content_decrypt(sealed.text, "bad".to_string());
        assert!(!failed.ok);
        assert!(!failed.message.is_empty());
        assert!(!content_encrypt("x".to_string(), String::new()).ok);
    }

    // Only test touching the process-wide vault.
    #[test]
    fn vault_lifecycle_over_ffi() {
        init_test_storage();
        if vault_state() == "no_setup" {
            let setup = vault_setup("secret1".to_string(), "secret1".to_string());
            assert!(setup.ok, "{}", setup.message);
        }
        assert!(vault_lock().ok);
        assert_eq!(vault_state(), "locked");
        assert!(!vault_item_list().ok);

        assert!(!vault_unlock("wrong".to_string()).ok);
        assert_eq!(vault_state(), "locked");

        let unlocked = vault_unlock("secret1".to_string());
        assert!(unlocked.ok, "{}", unlocked.message);
        assert_eq!(vault_state(), "unlocked");

        let added = vault_item_add("Deed".to_string(), "lot 42".to_string(), None, None);
        assert!(added.ok, "{}", added.message);
        let id = added.record_id.expect("vault item id");
        let listed = vault_item_list();
        assert!(listed.items.iter().any(|item| item.id == id && item.content == "lot 42"));

        assert!(vault_item_delete(id).ok);
        assert!(vault_lock().ok);
    }
}
