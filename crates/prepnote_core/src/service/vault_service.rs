//! Vault unlock state machine and the vault item store it gates.
//!
//! # Responsibility
//! - Configure the vault master password once (`setup_vault`).
//! - Move between `Locked` and `Unlocked` for the current app session.
//! - Serve vault item CRUD only while `Unlocked`.
//!
//! # Invariants
//! - The raw master password is never persisted; only an Argon2id PHC
//!   hash and a key-derivation salt are stored.
//! - The session key exists only in `VaultSession` memory and is zeroized
//!   on lock or drop. A new session always starts locked.
//! - Item operations in `NoSetup`/`Locked` fail with `VaultError::Locked`
//!   before touching the item collection.

use crate::codec::{
    derive_key, generate_salt, hash_password, verify_password, CodecError, KdfParams,
    SecureContentCodec, KEY_LEN,
};
use crate::model::note::{RecordId, SecurityData};
use crate::model::validation::{normalize_title, validate_master_password, ValidationError};
use crate::model::vault_item::{StoredVaultItem, VaultItemRecord, VaultItemUpdate};
use crate::repo::vault_repo::VaultRepository;
use crate::repo::{now_epoch_ms, RepoError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;
use zeroize::Zeroizing;

const VAULT_SETTINGS_KEY: &str = "vault";

/// Observable vault state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    /// No master password has ever been configured.
    NoSetup,
    /// Configured, not unlocked in this session.
    Locked,
    /// Master password verified in this session.
    Unlocked,
}

impl VaultState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSetup => "no_setup",
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
        }
    }
}

/// Service error for vault use-cases.
#[derive(Debug)]
pub enum VaultError {
    Validation(ValidationError),
    /// `unlock` was called before `setup_vault`.
    NotSetUp,
    IncorrectPassword,
    /// Item access attempted while not unlocked.
    Locked,
    NotFound(RecordId),
    Codec(CodecError),
    Repo(RepoError),
    /// Persisted vault configuration cannot be read.
    InvalidConfig(String),
}

impl Display for VaultError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotSetUp => write!(f, "vault is not set up"),
            Self::IncorrectPassword => write!(f, "incorrect password"),
            Self::Locked => write!(f, "vault is locked"),
            Self::NotFound(id) => write!(f, "vault item not found: {id}"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InvalidConfig(details) => write!(f, "invalid vault configuration: {details}"),
        }
    }
}

impl Error for VaultError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for VaultError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CodecError> for VaultError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<RepoError> for VaultError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Persisted vault configuration (settings key `vault`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VaultConfig {
    vault_id: Uuid,
    /// Argon2id PHC string.
    password_hash: String,
    /// Base64 salt for deriving the item sealing key.
    key_salt: String,
    kdf: KdfParams,
}

impl VaultConfig {
    fn key_salt(&self) -> Result<Vec<u8>, VaultError> {
        STANDARD
            .decode(&self.key_salt)
            .map_err(|err| VaultError::InvalidConfig(format!("key_salt: {err}")))
    }
}

struct UnlockedVault {
    vault_id: Uuid,
    key: Zeroizing<[u8; KEY_LEN]>,
}

/// Volatile per-app-session unlock state.
///
/// Dropping or locking the session wipes the key.
#[derive(Default)]
pub struct VaultSession {
    unlocked: Option<UnlockedVault>,
}

impl VaultSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the session key.
    pub fn lock(&mut self) {
        self.unlocked = None;
    }

    fn key_for(&self, vault_id: Uuid) -> Option<&[u8; KEY_LEN]> {
        self.unlocked
            .as_ref()
            .filter(|unlocked| unlocked.vault_id == vault_id)
            .map(|unlocked| &*unlocked.key)
    }
}

impl Debug for VaultSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("holds_key", &self.unlocked.is_some())
            .finish()
    }
}

/// Vault state machine plus gated vault item store.
pub struct VaultService<'s, R: VaultRepository> {
    repo: R,
    session: &'s mut VaultSession,
    kdf: KdfParams,
}

impl<'s, R: VaultRepository> VaultService<'s, R> {
    pub fn new(repo: R, session: &'s mut VaultSession) -> Self {
        Self::with_kdf_params(repo, session, KdfParams::default())
    }

    /// Uses `kdf` for password hashing and key derivation at setup time.
    pub fn with_kdf_params(repo: R, session: &'s mut VaultSession, kdf: KdfParams) -> Self {
        Self { repo, session, kdf }
    }

    pub fn state(&self) -> Result<VaultState, VaultError> {
        Ok(match self.load_config()? {
            None => VaultState::NoSetup,
            Some(config) if self.session.key_for(config.vault_id).is_some() => {
                VaultState::Unlocked
            }
            Some(_) => VaultState::Locked,
        })
    }

    /// Configures the master password and leaves the vault unlocked.
    ///
    /// # Errors
    /// - `Validation(VaultAlreadyConfigured)` when a vault already exists.
    /// - `Validation(PasswordMismatch | PasswordTooShort)` for bad input.
    pub fn setup_vault(&mut self, password: &str, confirm_password: &str) -> Result<(), VaultError> {
        if self.load_config()?.is_some() {
            return Err(ValidationError::VaultAlreadyConfigured.into());
        }
        validate_master_password(password, confirm_password)?;

        let salt = generate_salt();
        let config = VaultConfig {
            vault_id: Uuid::new_v4(),
            password_hash: hash_password(password, &self.kdf)?,
            key_salt: STANDARD.encode(salt),
            kdf: self.kdf,
        };
        let key = derive_key(password.as_bytes(), &salt, &config.kdf)?;
        self.save_config(&config)?;
        self.session.unlocked = Some(UnlockedVault {
            vault_id: config.vault_id,
            key,
        });

        info!("event=vault_setup module=vault status=ok");
        Ok(())
    }

    /// Verifies `password` and unlocks the vault for this session.
    ///
    /// Already unlocked plus correct password is a no-op. A wrong password
    /// never changes state.
    pub fn unlock(&mut self, password: &str) -> Result<(), VaultError> {
        let config = self.load_config()?.ok_or(VaultError::NotSetUp)?;
        if !verify_password(password, &config.password_hash)? {
            warn!("event=vault_unlock module=vault status=error reason=incorrect_password");
            return Err(VaultError::IncorrectPassword);
        }
        if self.session.key_for(config.vault_id).is_some() {
            return Ok(());
        }

        let key = derive_key(password.as_bytes(), &config.key_salt()?, &config.kdf)?;
        self.session.unlocked = Some(UnlockedVault {
            vault_id: config.vault_id,
            key,
        });
        info!("event=vault_unlock module=vault status=ok");
        Ok(())
    }

    /// Locks the vault. Always succeeds; locking a locked vault is a no-op.
    pub fn lock(&mut self) {
        if self.session.unlocked.is_some() {
            info!("event=vault_lock module=vault status=ok");
        }
        self.session.lock();
    }

    pub fn add_item(
        &self,
        title: &str,
        content: &str,
        security_data: Option<SecurityData>,
    ) -> Result<VaultItemRecord, VaultError> {
        let key = self.session_key("add")?;
        let title = normalize_title(title)?;
        if let Some(data) = security_data.as_ref() {
            data.validate()?;
        }

        let now = now_epoch_ms();
        let stored = StoredVaultItem {
            id: Uuid::new_v4(),
            title,
            sealed_content: SecureContentCodec::seal_with_key(key, content)?,
            security_data,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_item(&stored)?;
        info!("event=vault_item_add module=vault status=ok");
        open_item(key, stored)
    }

    pub fn update_item(
        &self,
        id: RecordId,
        update: VaultItemUpdate,
    ) -> Result<VaultItemRecord, VaultError> {
        let key = self.session_key("update")?;
        let title = update.title.as_deref().map(normalize_title).transpose()?;
        let sealed = update
            .content
            .as_deref()
            .map(|content| SecureContentCodec::seal_with_key(key, content))
            .transpose()?;
        self.repo
            .update_item(id, title.as_deref(), sealed.as_deref(), now_epoch_ms())?;
        let stored = self.repo.get_item(id)?.ok_or(VaultError::NotFound(id))?;
        open_item(key, stored)
    }

    pub fn delete_item(&self, id: RecordId) -> Result<(), VaultError> {
        self.session_key("delete")?;
        self.repo.delete_item(id)?;
        info!("event=vault_item_delete module=vault status=ok");
        Ok(())
    }

    pub fn get_item(&self, id: RecordId) -> Result<VaultItemRecord, VaultError> {
        let key = self.session_key("get")?;
        let stored = self.repo.get_item(id)?.ok_or(VaultError::NotFound(id))?;
        open_item(key, stored)
    }

    /// Returns all items in insertion order with plaintext content.
    pub fn list_items(&self) -> Result<Vec<VaultItemRecord>, VaultError> {
        let key = self.session_key("list")?;
        self.repo
            .list_items()?
            .into_iter()
            .map(|stored| open_item(key, stored))
            .collect()
    }

    fn session_key(&self, op: &'static str) -> Result<&[u8; KEY_LEN], VaultError> {
        let key = self
            .load_config()?
            .and_then(|config| self.session.key_for(config.vault_id));
        match key {
            Some(key) => Ok(key),
            None => {
                debug!("event=vault_gate module=vault status=rejected op={op}");
                Err(VaultError::Locked)
            }
        }
    }

    fn load_config(&self) -> Result<Option<VaultConfig>, VaultError> {
        self.repo
            .get_setting(VAULT_SETTINGS_KEY)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|err| VaultError::InvalidConfig(err.to_string()))
            })
            .transpose()
    }

    fn save_config(&self, config: &VaultConfig) -> Result<(), VaultError> {
        let raw = serde_json::to_string(config)
            .map_err(|err| VaultError::InvalidConfig(err.to_string()))?;
        self.repo.put_setting(VAULT_SETTINGS_KEY, &raw)?;
        Ok(())
    }
}

fn open_item(key: &[u8; KEY_LEN], stored: StoredVaultItem) -> Result<VaultItemRecord, VaultError> {
    let content = SecureContentCodec::open_with_key(key, &stored.sealed_content)?;
    Ok(VaultItemRecord {
        id: stored.id,
        title: stored.title,
        content,
        security_data: stored.security_data,
        created_at: stored.created_at,
        updated_at: stored.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::{VaultSession, VaultState};

    #[test]
    fn session_debug_output_hides_key_material() {
        let session = VaultSession::new();
        let rendered = format!("{session:?}");
        assert!(rendered.contains("holds_key: false"));
    }

    #[test]
    fn state_labels_are_stable() {
        assert_eq!(VaultState::NoSetup.as_str(), "no_setup");
        assert_eq!(VaultState::Locked.as_str(), "locked");
        assert_eq!(VaultState::Unlocked.as_str(), "unlocked");
    }
}
