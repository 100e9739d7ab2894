use prepnote_core::db::{open_db, open_db_in_memory};
use prepnote_core::{
    NoteService, NoteServiceError, NoteUpdate, SecurityData, SqliteNoteRepository,
    ValidationError,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn passport_note_is_listed_with_its_content() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    service.add("Passport", "1234-5678", false, None).unwrap();

    let notes = service.list().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Passport");
    assert_eq!(notes[0].content, "1234-5678");
    assert!(!notes[0].is_encrypted);
}

#[test]
fn add_appends_exactly_one_record_with_equal_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    service.add("first", "a", false, None).unwrap();
    let before = service.list().unwrap().len();

    let created = service.add("Water plan", "4L per person", false, None).unwrap();

    let after = service.list().unwrap();
    assert_eq!(after.len(), before + 1);
    let stored = after.iter().find(|note| note.id == created.id).unwrap();
    assert_eq!(stored.title, "Water plan");
    assert_eq!(stored.content, "4L per person");
    assert_eq!(stored.created_at, stored.updated_at);
}

#[test]
fn update_refreshes_timestamp_and_keeps_identity() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let created = service.add("Kit", "flashlight", false, None).unwrap();

    let first = service
        .update(
            created.id,
            NoteUpdate {
                title: Some("Go bag".to_string()),
                content: Some("flashlight, radio".to_string()),
            },
        )
        .unwrap();
    assert!(first.updated_at > created.updated_at);
    assert_eq!(first.id, created.id);
    assert_eq!(first.created_at, created.created_at);
    assert_eq!(first.is_encrypted, created.is_encrypted);
    assert_eq!(first.title, "Go bag");
    assert_eq!(first.content, "flashlight, radio");

    // Back-to-back edits inside the same millisecond still move forward.
    let second = service
        .update(created.id, NoteUpdate::content("flashlight, radio, batteries"))
        .unwrap();
    assert!(second.updated_at > first.updated_at);
    assert_eq!(second.title, "Go bag");

    let touched = service.update(created.id, NoteUpdate::default()).unwrap();
    assert!(touched.updated_at > second.updated_at);
    assert_eq!(touched.content, "flashlight, radio, batteries");
}

#[test]
fn update_keeps_encrypted_flag() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let created = service.add("Bank", "c1", true, None).unwrap();

    let updated = service
        .update(created.id, NoteUpdate::content("c2"))
        .unwrap();
    assert!(updated.is_encrypted);
    assert_eq!(updated.content, "c2");
}

#[test]
fn delete_removes_record_and_second_delete_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let keep = service.add("keep", "k", false, None).unwrap();
    let doomed = service.add("doomed", "d", false, None).unwrap();

    service.delete(doomed.id).unwrap();
    let ids: Vec<Uuid> = service.list().unwrap().iter().map(|note| note.id).collect();
    assert_eq!(ids, vec![keep.id]);

    let err = service.delete(doomed.id).unwrap_err();
    assert!(matches!(err, NoteServiceError::NotFound(id) if id == doomed.id));
}

#[test]
fn operations_on_unknown_id_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let missing = Uuid::new_v4();

    assert!(matches!(
        service.update(missing, NoteUpdate::title("x")).unwrap_err(),
        NoteServiceError::NotFound(_)
    ));
    assert!(matches!(
        service.get(missing).unwrap_err(),
        NoteServiceError::NotFound(_)
    ));
}

#[test]
fn blank_titles_are_rejected_without_side_effects() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let created = service.add("  Radio  ", "FM 101.1", false, None).unwrap();
    assert_eq!(created.title, "Radio");

    let err = service.add("   ", "body", false, None).unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Validation(ValidationError::EmptyTitle)
    ));

    let err = service
        .update(created.id, NoteUpdate::title(""))
        .unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Validation(ValidationError::EmptyTitle)
    ));
    assert_eq!(service.get(created.id).unwrap(), created);
    assert_eq!(service.list().unwrap().len(), 1);
}

#[test]
fn list_keeps_insertion_order_and_list_recent_sorts_by_update() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let first = service.add("first", "1", false, None).unwrap();
    let second = service.add("second", "2", false, None).unwrap();
    let third = service.add("third", "3", false, None).unwrap();

    conn.execute(
        "UPDATE notes SET updated_at = created_at + 5000 WHERE id = ?1;",
        [first.id.to_string()],
    )
    .unwrap();

    let listed: Vec<Uuid> = service.list().unwrap().iter().map(|n| n.id).collect();
    assert_eq!(listed, vec![first.id, second.id, third.id]);

    let recent = service.list_recent().unwrap();
    assert_eq!(recent[0].id, first.id);
}

#[test]
fn security_data_is_stored_in_plaintext() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let created = service
        .add(
            "Safe combo",
            "ciphertext-goes-here",
            true,
            Some(SecurityData::new("First pet?", "Rex")),
        )
        .unwrap();

    // The hint offers no confidentiality: it is readable straight from storage.
    let answer: String = conn
        .query_row(
            "SELECT security_answer FROM notes WHERE id = ?1;",
            [created.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(answer, "Rex");

    let loaded = service.get(created.id).unwrap();
    assert_eq!(
        loaded.security_data,
        Some(SecurityData::new("First pet?", "Rex"))
    );
}

#[test]
fn incomplete_security_data_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let err = service
        .add("x", "y", true, Some(SecurityData::new("Pet?", " ")))
        .unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Validation(ValidationError::IncompleteSecurityData)
    ));
    assert!(service.list().unwrap().is_empty());
}

#[test]
fn encrypted_flag_cannot_be_toggled_in_storage() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let created = service.add("Bank", "cipher", true, None).unwrap();

    let result = conn.execute(
        "UPDATE notes SET is_encrypted = 0 WHERE id = ?1;",
        [created.id.to_string()],
    );
    assert!(result.is_err());
    assert!(service.get(created.id).unwrap().is_encrypted);
}

#[test]
fn notes_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.db");

    let created = {
        let conn = open_db(&path).unwrap();
        let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
        service.add("Evacuation route", "north bridge", false, None).unwrap()
    };

    let conn = open_db(&path).unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    assert_eq!(service.get(created.id).unwrap(), created);
}

#[test]
fn repository_requires_migrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(SqliteNoteRepository::try_new(&conn).is_err());
}
