//! Vault item repository contract and SQLite implementation.
//!
//! Items are stored sealed; this layer never sees plaintext content or
//! key material. Vault configuration is kept in the settings table, so
//! the vault repository is also a `SettingsRepository`.

use crate::model::note::RecordId;
use crate::model::vault_item::StoredVaultItem;
use crate::repo::settings_repo::{get_setting, put_setting, SettingsRepository};
use crate::repo::{
    ensure_tables, parse_record_id, security_from_columns, security_to_columns, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    title,
    sealed_content,
    security_question,
    security_answer,
    created_at,
    updated_at
FROM vault_items";

/// Repository interface for vault items and vault configuration.
pub trait VaultRepository: SettingsRepository {
    fn insert_item(&self, item: &StoredVaultItem) -> RepoResult<()>;
    fn update_item(
        &self,
        id: RecordId,
        title: Option<&str>,
        sealed_content: Option<&str>,
        now_ms: i64,
    ) -> RepoResult<()>;
    fn delete_item(&self, id: RecordId) -> RepoResult<()>;
    fn get_item(&self, id: RecordId) -> RepoResult<Option<StoredVaultItem>>;
    fn list_items(&self) -> RepoResult<Vec<StoredVaultItem>>;
}

/// SQLite-backed vault repository.
pub struct SqliteVaultRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVaultRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["vault_items", "settings"])?;
        Ok(Self { conn })
    }
}

impl SettingsRepository for SqliteVaultRepository<'_> {
    fn get_setting(&self, key: &str) -> RepoResult<Option<String>> {
        get_setting(self.conn, key)
    }

    fn put_setting(&self, key: &str, value: &str) -> RepoResult<()> {
        put_setting(self.conn, key, value)
    }
}

impl VaultRepository for SqliteVaultRepository<'_> {
    fn insert_item(&self, item: &StoredVaultItem) -> RepoResult<()> {
        let (question, answer) = security_to_columns(item.security_data.as_ref());
        self.conn.execute(
            "INSERT INTO vault_items (
                id,
                title,
                sealed_content,
                security_question,
                security_answer,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                item.id.to_string(),
                item.title,
                item.sealed_content,
                question,
                answer,
                item.created_at,
                item.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update_item(
        &self,
        id: RecordId,
        title: Option<&str>,
        sealed_content: Option<&str>,
        now_ms: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE vault_items
             SET
                title = COALESCE(?2, title),
                sealed_content = COALESCE(?3, sealed_content),
                updated_at = MAX(?4, updated_at + 1)
             WHERE id = ?1;",
            params![id.to_string(), title, sealed_content, now_ms],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_item(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM vault_items WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn get_item(&self, id: RecordId) -> RepoResult<Option<StoredVaultItem>> {
        let sql = format!("{ITEM_SELECT_SQL} WHERE id = ?1;");
        let row = self
            .conn
            .query_row(&sql, [id.to_string()], read_raw_item)
            .optional()?;
        row.map(RawItem::into_item).transpose()
    }

    fn list_items(&self) -> RepoResult<Vec<StoredVaultItem>> {
        let sql = format!("{ITEM_SELECT_SQL} ORDER BY seq ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_raw_item)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?.into_item()?);
        }
        Ok(items)
    }
}

struct RawItem {
    id: String,
    title: String,
    sealed_content: String,
    security_question: Option<String>,
    security_answer: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl RawItem {
    fn into_item(self) -> RepoResult<StoredVaultItem> {
        Ok(StoredVaultItem {
            id: parse_record_id(&self.id, "vault_items.id")?,
            title: self.title,
            sealed_content: self.sealed_content,
            security_data: security_from_columns(self.security_question, self.security_answer),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn read_raw_item(row: &Row<'_>) -> rusqlite::Result<RawItem> {
    Ok(RawItem {
        id: row.get("id")?,
        title: row.get("title")?,
        sealed_content: row.get("sealed_content")?,
        security_question: row.get("security_question")?,
        security_answer: row.get("security_answer")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
