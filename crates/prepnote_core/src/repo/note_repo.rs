//! Note repository contract and SQLite implementation.
//!
//! # Invariants
//! - `list_notes` returns insertion order (`seq ASC`).
//! - `update_note` always advances `updated_at` strictly past its
//!   previous value.
//! - `is_encrypted` is never written after insert.

use crate::model::note::{NoteRecord, RecordId};
use crate::repo::{
    ensure_tables, parse_record_id, security_from_columns, security_to_columns, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    is_encrypted,
    security_question,
    security_answer,
    created_at,
    updated_at
FROM notes";

/// Repository interface for the note collection.
pub trait NoteRepository {
    fn insert_note(&self, note: &NoteRecord) -> RepoResult<()>;
    /// Replaces provided fields and bumps `updated_at` to at least `now_ms`.
    fn update_note(
        &self,
        id: RecordId,
        title: Option<&str>,
        content: Option<&str>,
        now_ms: i64,
    ) -> RepoResult<()>;
    fn delete_note(&self, id: RecordId) -> RepoResult<()>;
    fn get_note(&self, id: RecordId) -> RepoResult<Option<NoteRecord>>;
    fn list_notes(&self) -> RepoResult<Vec<NoteRecord>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["notes"])?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, note: &NoteRecord) -> RepoResult<()> {
        let (question, answer) = security_to_columns(note.security_data.as_ref());
        self.conn.execute(
            "INSERT INTO notes (
                id,
                title,
                content,
                is_encrypted,
                security_question,
                security_answer,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                note.id.to_string(),
                note.title,
                note.content,
                note.is_encrypted,
                question,
                answer,
                note.created_at,
                note.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update_note(
        &self,
        id: RecordId,
        title: Option<&str>,
        content: Option<&str>,
        now_ms: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content),
                updated_at = MAX(?4, updated_at + 1)
             WHERE id = ?1;",
            params![id.to_string(), title, content, now_ms],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_note(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn get_note(&self, id: RecordId) -> RepoResult<Option<NoteRecord>> {
        let sql = format!("{NOTE_SELECT_SQL} WHERE id = ?1;");
        let row = self
            .conn
            .query_row(&sql, [id.to_string()], read_raw_note)
            .optional()?;
        row.map(RawNote::into_record).transpose()
    }

    fn list_notes(&self) -> RepoResult<Vec<NoteRecord>> {
        let sql = format!("{NOTE_SELECT_SQL} ORDER BY seq ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_raw_note)?;
        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?.into_record()?);
        }
        Ok(notes)
    }
}

struct RawNote {
    id: String,
    title: String,
    content: String,
    is_encrypted: bool,
    security_question: Option<String>,
    security_answer: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl RawNote {
    fn into_record(self) -> RepoResult<NoteRecord> {
        Ok(NoteRecord {
            id: parse_record_id(&self.id, "notes.id")?,
            title: self.title,
            content: self.content,
            is_encrypted: self.is_encrypted,
            security_data: security_from_columns(self.security_question, self.security_answer),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn read_raw_note(row: &Row<'_>) -> rusqlite::Result<RawNote> {
    Ok(RawNote {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        is_encrypted: row.get("is_encrypted")?,
        security_question: row.get("security_question")?,
        security_answer: row.get("security_answer")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
