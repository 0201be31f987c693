use thoughtcanvas_core::db::migrations::latest_version;
use thoughtcanvas_core::db::{open_db, DbError};
use thoughtcanvas_core::service::content_forms;
use thoughtcanvas_core::service::json_io::{export_notebooks, parse_notebooks};
use thoughtcanvas_core::storage::persistence::{
    default_notebooks, load_notebooks, NOTEBOOKS_KEY,
};
use thoughtcanvas_core::{
    LocalStorage, MemoryLocalStorage, NotebookStore, PersistenceError, SqliteLocalStorage,
    StorageError, StoreError,
};

#[test]
fn empty_storage_is_seeded_with_defaults() {
    let mut storage = MemoryLocalStorage::new();
    let notebooks = load_notebooks(&mut storage).unwrap();

    let titles: Vec<&str> = notebooks.iter().map(|notebook| notebook.title.as_str()).collect();
    assert_eq!(titles, vec!["Personal", "Work"]);
    assert_eq!(notebooks[0].notes[0].title, "My First Note");
    assert_eq!(notebooks[0].notes[0].lines.len(), 2);
    assert!(notebooks[1].notes.is_empty());
    assert!(storage.get_item(NOTEBOOKS_KEY).unwrap().is_some());
}

#[test]
fn empty_stored_value_counts_as_missing() {
    let mut storage = MemoryLocalStorage::new();
    storage.set_item(NOTEBOOKS_KEY, "").unwrap();
    let notebooks = load_notebooks(&mut storage).unwrap();
    assert_eq!(notebooks.len(), default_notebooks().len());
}

#[test]
fn corrupt_document_is_reported_not_replaced() {
    let mut storage = MemoryLocalStorage::new();
    storage.set_item(NOTEBOOKS_KEY, "{not json").unwrap();

    let err = NotebookStore::open(storage).err().unwrap();
    assert!(matches!(
        err,
        StoreError::Persistence(PersistenceError::Serialization(_))
    ));
}

#[test]
fn mutations_survive_reopen_of_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thoughtcanvas.sqlite3");

    let note_id = {
        let mut store = NotebookStore::open(SqliteLocalStorage::open(&path).unwrap()).unwrap();
        let note_id = store.create_note("notebook-2", "Retro").unwrap().unwrap();
        let line_id = store.add_line_to_note(&note_id, "went well").unwrap().unwrap();
        store
            .add_content_to_line(
                &note_id,
                &line_id,
                content_forms::markdown("**shipped**").unwrap(),
            )
            .unwrap();
        store.link_notes(&note_id, "note-1").unwrap();
        note_id
    };

    let reopened = NotebookStore::open(SqliteLocalStorage::open(&path).unwrap()).unwrap();
    let note = reopened.find_note(&note_id).unwrap();
    assert_eq!(note.title, "Retro");
    assert_eq!(note.lines[0].tags, vec!["markdown"]);
    assert_eq!(note.lines[0].content.as_ref().unwrap().value(), "**shipped**");
    assert_eq!(note.linked_notes, vec!["note-1"]);
}

#[test]
fn export_then_parse_yields_equal_collection() {
    let mut store = NotebookStore::open(MemoryLocalStorage::new()).unwrap();
    let line_id = store.add_line_to_note("note-1", "grid").unwrap().unwrap();
    let table = content_forms::table_from_json(r#"{"headers":["A","B"],"rows":[["1"]]}"#).unwrap();
    store.add_content_to_line("note-1", &line_id, table).unwrap();

    let exported = export_notebooks(store.notebooks()).unwrap();
    let parsed = parse_notebooks(&exported).unwrap();
    assert_eq!(parsed, store.notebooks());

    let mut reseeded = MemoryLocalStorage::new();
    reseeded.set_item(NOTEBOOKS_KEY, &exported).unwrap();
    let reopened = NotebookStore::open(reseeded).unwrap();
    assert_eq!(reopened.notebooks(), store.notebooks());
}

#[test]
fn sqlite_storage_upserts_and_removes() {
    let mut storage = SqliteLocalStorage::in_memory().unwrap();
    assert_eq!(storage.get_item("k").unwrap(), None);

    storage.set_item("k", "one").unwrap();
    storage.set_item("k", "two").unwrap();
    assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("two"));

    storage.remove_item("k").unwrap();
    assert_eq!(storage.get_item("k").unwrap(), None);
}

#[test]
fn sqlite_storage_rejects_connection_without_table() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let err = SqliteLocalStorage::try_new(conn).err().unwrap();
    assert!(matches!(err, StorageError::MissingRequiredTable("local_storage")));
}

#[test]
fn opening_database_twice_keeps_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("twice.sqlite3");
    drop(open_db(&path).unwrap());
    let conn = open_db(&path).unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 99;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 99);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}
