//! Key-value settings storage.
//!
//! Holds small JSON blobs such as the vault configuration. Values are
//! opaque strings to this layer.

use crate::repo::{ensure_tables, now_epoch_ms, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for the settings table.
pub trait SettingsRepository {
    fn get_setting(&self, key: &str) -> RepoResult<Option<String>>;
    /// Inserts or replaces `key`.
    fn put_setting(&self, key: &str, value: &str) -> RepoResult<()>;
}

/// SQLite-backed settings repository.
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["settings"])?;
        Ok(Self { conn })
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn get_setting(&self, key: &str) -> RepoResult<Option<String>> {
        get_setting(self.conn, key)
    }

    fn put_setting(&self, key: &str, value: &str) -> RepoResult<()> {
        put_setting(self.conn, key, value)
    }
}

pub(crate) fn get_setting(conn: &Connection, key: &str) -> RepoResult<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM settings WHERE key = ?1;", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

pub(crate) fn put_setting(conn: &Connection, key: &str, value: &str) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO settings (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at;",
        params![key, value, now_epoch_ms()],
    )?;
    Ok(())
}
