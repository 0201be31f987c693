use thoughtcanvas_core::service::json_io::{
    export_notebooks, import_collection, import_note, import_note_update, import_notebook,
    note_template, notebook_template, parse_note_draft, parse_notebook_draft,
};
use thoughtcanvas_core::{JsonImportError, MemoryLocalStorage, NotebookStore};

fn seeded_store() -> NotebookStore<MemoryLocalStorage> {
    NotebookStore::open(MemoryLocalStorage::new()).unwrap()
}

#[test]
fn notebook_draft_requires_title() {
    let draft = parse_notebook_draft(r#"{"title":"Ideas","description":"misc"}"#).unwrap();
    assert_eq!(draft.title, "Ideas");
    assert_eq!(draft.description.as_deref(), Some("misc"));

    assert!(matches!(
        parse_notebook_draft(r#"{"description":"no title"}"#),
        Err(JsonImportError::MissingField("title"))
    ));
    assert!(matches!(
        parse_notebook_draft("not json"),
        Err(JsonImportError::InvalidJson(_))
    ));
}

#[test]
fn note_draft_requires_notebook_id_and_title() {
    assert!(matches!(
        parse_note_draft(r#"{"title":"x"}"#),
        Err(JsonImportError::MissingField("notebookId"))
    ));
    assert!(matches!(
        parse_note_draft(r#"{"notebookId":"notebook-1","title":"  "}"#),
        Err(JsonImportError::MissingField("title"))
    ));
}

#[test]
fn drafts_are_trimmed() {
    let draft = parse_notebook_draft(r#"{"title":"  Work  ","description":"  "}"#).unwrap();
    assert_eq!(draft.title, "Work");
    assert_eq!(draft.description, None);

    let mut store = seeded_store();
    let notebook_id = import_notebook(&mut store, r#"{"title":"  Padded  "}"#).unwrap();
    assert_eq!(store.notebook(&notebook_id).unwrap().title, "Padded");
}

#[test]
fn import_notebook_and_note_create_entities() {
    let mut store = seeded_store();
    let notebook_id = import_notebook(&mut store, r#"{"title":"Imported"}"#).unwrap();
    assert_eq!(store.notebook(&notebook_id).unwrap().title, "Imported");

    let json = format!(r#"{{"notebookId":"{notebook_id}","title":"From JSON"}}"#);
    let note_id = import_note(&mut store, &json).unwrap();
    assert_eq!(store.notebook_of(&note_id).unwrap().id, notebook_id);
    assert_eq!(store.current_note().unwrap().title, "From JSON");
}

#[test]
fn import_note_into_missing_notebook_fails_without_change() {
    let mut store = seeded_store();
    let before = export_notebooks(store.notebooks()).unwrap();
    let err = import_note(&mut store, r#"{"notebookId":"nope","title":"Lost"}"#).unwrap_err();
    assert!(matches!(err, JsonImportError::NotebookNotFound(id) if id == "nope"));
    assert_eq!(export_notebooks(store.notebooks()).unwrap(), before);
}

#[test]
fn full_note_update_replaces_note_in_place() {
    let mut store = seeded_store();
    let mut note = store.find_note("note-1").unwrap().clone();
    note.title = "Rewritten".to_string();
    note.lines.truncate(1);
    let json = serde_json::to_string(&note).unwrap();

    let note_id = import_note_update(&mut store, &json).unwrap();
    assert_eq!(note_id, "note-1");
    let stored = store.find_note("note-1").unwrap();
    assert_eq!(stored.title, "Rewritten");
    assert_eq!(stored.lines.len(), 1);
    assert_eq!(store.notebook("notebook-1").unwrap().notes.len(), 1);
}

#[test]
fn full_note_update_for_unknown_id_fails() {
    let mut store = seeded_store();
    let mut note = store.find_note("note-1").unwrap().clone();
    note.id = "note-ghost".to_string();
    let json = serde_json::to_string(&note).unwrap();
    assert!(matches!(
        import_note_update(&mut store, &json),
        Err(JsonImportError::NoteNotFound(_))
    ));
}

#[test]
fn full_note_update_rejects_self_link() {
    let mut store = seeded_store();
    let before = export_notebooks(store.notebooks()).unwrap();
    let mut note = store.find_note("note-1").unwrap().clone();
    note.linked_notes.push("note-1".to_string());
    let json = serde_json::to_string(&note).unwrap();

    let err = import_note_update(&mut store, &json).unwrap_err();
    assert!(matches!(err, JsonImportError::SelfLink(id) if id == "note-1"));
    assert!(store.find_note("note-1").unwrap().linked_notes.is_empty());
    assert_eq!(export_notebooks(store.notebooks()).unwrap(), before);
}

#[test]
fn full_note_update_rejects_second_checklist_level() {
    let mut store = seeded_store();
    let before = export_notebooks(store.notebooks()).unwrap();
    let mut note: serde_json::Value =
        serde_json::to_value(store.find_note("note-1").unwrap()).unwrap();
    note["lines"][0]["content"] = serde_json::json!({
        "id": "content-deep",
        "type": "checklist",
        "value": "Checklist",
        "createdAt": "2024-01-01T00:00:00Z",
        "checklistItems": [{
            "id": "p",
            "text": "parent",
            "checked": false,
            "children": [{
                "id": "c",
                "text": "child",
                "checked": false,
                "children": [{"id": "g", "text": "deep", "checked": false}]
            }]
        }]
    });

    let err = import_note_update(&mut store, &note.to_string()).unwrap_err();
    assert!(matches!(
        err,
        JsonImportError::ChecklistTooDeep { ref note_id, ref line_id }
            if note_id == "note-1" && line_id == "line-1"
    ));
    assert_eq!(export_notebooks(store.notebooks()).unwrap(), before);
}

#[test]
fn collection_import_rejects_self_linked_note() {
    let mut store = seeded_store();
    let mut notebooks = store.notebooks().to_vec();
    notebooks[0].notes[0].linked_notes.push("note-1".to_string());
    let json = export_notebooks(&notebooks).unwrap();

    assert!(matches!(
        import_collection(&mut store, &json),
        Err(JsonImportError::SelfLink(_))
    ));
    assert!(store.find_note("note-1").unwrap().linked_notes.is_empty());
}

#[test]
fn collection_import_replaces_everything() {
    let mut store = seeded_store();
    let mut other = seeded_store();
    other.create_notebook("Third", None).unwrap();
    let exported = export_notebooks(other.notebooks()).unwrap();

    assert_eq!(import_collection(&mut store, &exported).unwrap(), 3);
    assert_eq!(store.notebooks(), other.notebooks());
    assert!(store
        .take_notifications()
        .iter()
        .any(|notification| notification.message == "Notebooks imported!"));
}

#[test]
fn malformed_collection_leaves_store_untouched() {
    let mut store = seeded_store();
    assert!(import_collection(&mut store, r#"[{"id":"x"}]"#).is_err());
    assert_eq!(store.notebooks().len(), 2);
}

#[test]
fn templates_parse_back_into_drafts() {
    let notebook = parse_notebook_draft(&notebook_template()).unwrap();
    assert_eq!(notebook.title, "New Notebook Title");

    let note = parse_note_draft(&note_template(Some("notebook-2"))).unwrap();
    assert_eq!(note.notebook_id, "notebook-2");
    let placeholder = parse_note_draft(&note_template(None)).unwrap();
    assert_eq!(placeholder.notebook_id, "notebook-id-here");
}
