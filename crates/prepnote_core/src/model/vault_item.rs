//! Vault item domain model.
//!
//! Vault items have the note shape minus the per-item encryption flag.
//! They are protected by the vault master password as a whole: content is
//! sealed at rest with the session key and only ever handed out in
//! plaintext while the vault is unlocked.

use serde::{Deserialize, Serialize};

use super::note::{RecordId, SecurityData};

/// Vault item as returned to callers of an unlocked vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultItemRecord {
    pub id: RecordId,
    pub title: String,
    /// Plaintext content.
    pub content: String,
    pub security_data: Option<SecurityData>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Vault item as persisted: `sealed_content` is a key envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVaultItem {
    pub id: RecordId,
    pub title: String,
    pub sealed_content: String,
    pub security_data: Option<SecurityData>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial update for title and/or plaintext content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultItemUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}
