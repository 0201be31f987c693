use chrono::{Duration, Utc};
use thoughtcanvas_core::model::checklist::{ChecklistItem, ChecklistPath};
use thoughtcanvas_core::model::table::TableEdit;
use thoughtcanvas_core::service::content_forms::{self, ChecklistDraftItem, ChecklistDraftLeaf};
use thoughtcanvas_core::storage::persistence::{save_notebooks, NOTEBOOKS_KEY};
use thoughtcanvas_core::{
    ContentKind, LocalStorage, MemoryLocalStorage, Note, Notebook, NotebookStore, StoreError,
};

fn seeded_store() -> NotebookStore<MemoryLocalStorage> {
    NotebookStore::open(MemoryLocalStorage::new()).unwrap()
}

/// Store whose single note was last updated an hour ago.
fn store_with_stale_note() -> NotebookStore<MemoryLocalStorage> {
    let an_hour_ago = Utc::now() - Duration::hours(1);
    let mut note = Note::new("Stale");
    note.id = "note-stale".to_string();
    note.created_at = an_hour_ago;
    note.updated_at = an_hour_ago;
    let mut target = Note::new("Target");
    target.id = "note-target".to_string();
    target.created_at = an_hour_ago;
    target.updated_at = an_hour_ago;

    let mut notebook = Notebook::new("Archive", None);
    notebook.id = "notebook-archive".to_string();
    notebook.notes = vec![note, target];

    let mut storage = MemoryLocalStorage::new();
    save_notebooks(&mut storage, &[notebook]).unwrap();
    NotebookStore::open(storage).unwrap()
}

fn ghost_note() -> Note {
    let mut note = Note::new("Ghost");
    note.id = "missing".to_string();
    note
}

fn stored_document(store: &NotebookStore<MemoryLocalStorage>) -> String {
    store.storage().get_item(NOTEBOOKS_KEY).unwrap().unwrap()
}

#[test]
fn open_selects_first_notebook_and_no_note() {
    let store = seeded_store();
    assert_eq!(store.current_notebook().unwrap().id, "notebook-1");
    assert!(store.current_note().is_none());
}

#[test]
fn create_notebook_appends_selects_and_persists() {
    let mut store = seeded_store();
    let id = store
        .create_notebook("Travel", Some("Trips".to_string()))
        .unwrap();

    assert_eq!(store.notebooks().len(), 3);
    assert_eq!(store.notebooks().last().unwrap().id, id);
    assert_eq!(store.current_notebook().unwrap().title, "Travel");
    assert!(store.current_note().is_none());
    assert!(stored_document(&store).contains("Travel"));

    let messages: Vec<String> = store
        .take_notifications()
        .into_iter()
        .map(|notification| notification.message)
        .collect();
    assert_eq!(messages, vec!["Notebook created!".to_string()]);
    assert!(store.take_notifications().is_empty());
}

#[test]
fn create_note_targets_notebook_and_becomes_current() {
    let mut store = seeded_store();
    let note_id = store.create_note("notebook-2", "Standup").unwrap().unwrap();

    let work = store.notebook("notebook-2").unwrap();
    assert_eq!(work.notes.len(), 1);
    assert_eq!(work.notes[0].id, note_id);
    assert!(work.notes[0].lines.is_empty());
    assert_eq!(store.current_notebook().unwrap().id, "notebook-2");
    assert_eq!(store.current_note().unwrap().id, note_id);
}

#[test]
fn create_note_in_unknown_notebook_is_noop() {
    let mut store = seeded_store();
    let before = stored_document(&store);
    assert_eq!(store.create_note("missing", "Nope").unwrap(), None);
    assert_eq!(stored_document(&store), before);
    assert!(store.take_notifications().is_empty());
}

#[test]
fn add_line_appends_and_refreshes_updated_at() {
    let mut store = store_with_stale_note();
    let before = store.find_note("note-stale").unwrap().updated_at;

    let line_id = store
        .add_line_to_note("note-stale", "hello")
        .unwrap()
        .unwrap();

    let note = store.find_note("note-stale").unwrap();
    assert_eq!(note.lines.last().unwrap().id, line_id);
    assert_eq!(note.lines.last().unwrap().text, "hello");
    assert!(note.lines.last().unwrap().tags.is_empty());
    assert!(note.updated_at > before);
}

#[test]
fn update_and_delete_line() {
    let mut store = seeded_store();
    assert!(store.update_line("note-1", "line-1", "edited").unwrap());
    assert_eq!(
        store.find_note("note-1").unwrap().line("line-1").unwrap().text,
        "edited"
    );

    assert!(store.delete_line("note-1", "line-1").unwrap());
    let note = store.find_note("note-1").unwrap();
    assert_eq!(note.lines.len(), 1);
    assert_eq!(note.lines[0].id, "line-2");
}

#[test]
fn lookup_misses_leave_state_and_timestamps_untouched() {
    let mut store = store_with_stale_note();
    let before_doc = stored_document(&store);
    let before_note = store.find_note("note-stale").unwrap().clone();

    assert!(!store.update_line("note-stale", "missing", "x").unwrap());
    assert!(!store.delete_line("note-stale", "missing").unwrap());
    assert_eq!(store.add_line_to_note("missing", "x").unwrap(), None);
    assert!(!store.delete_note("missing").unwrap());
    assert!(!store
        .add_content_to_line("note-stale", "missing", content_forms::link("a").unwrap())
        .unwrap());
    assert!(!store
        .add_content_to_line("missing", "missing", content_forms::link("a").unwrap())
        .unwrap());
    assert!(!store.add_tag_to_line("note-stale", "missing", "idea").unwrap());
    assert!(!store.add_tag_to_line("missing", "missing", "idea").unwrap());
    assert!(!store.link_notes("missing", "note-stale").unwrap());
    assert!(!store.unlink_notes("missing", "note-stale").unwrap());
    assert!(!store.unlink_notes("note-stale", "note-target").unwrap());
    assert!(!store.update_note(ghost_note()).unwrap());
    assert!(!store.rename_note("missing", "Title").unwrap());

    let path = ChecklistPath::top_level("missing");
    let leaf = ChecklistItem {
        id: "missing".to_string(),
        text: "x".to_string(),
        checked: true,
        children: None,
    };
    assert!(!store
        .update_checklist_item("missing", "missing", &path, leaf.clone())
        .unwrap());
    assert!(!store
        .update_checklist_item("note-stale", "missing", &path, leaf)
        .unwrap());
    assert!(!store
        .toggle_checklist_item("missing", "missing", &path, true)
        .unwrap());
    assert!(!store
        .toggle_checklist_item("note-stale", "missing", &path, true)
        .unwrap());
    assert!(!store
        .update_table("missing", "missing", TableEdit::AddRow)
        .unwrap());
    assert!(!store
        .update_table("note-stale", "missing", TableEdit::AddRow)
        .unwrap());

    assert_eq!(store.find_note("note-stale").unwrap(), &before_note);
    assert_eq!(stored_document(&store), before_doc);
}

#[test]
fn add_content_sets_slot_and_accumulates_tags() {
    let mut store = seeded_store();
    let link = content_forms::link("  https://example.com ").unwrap();
    assert!(store.add_content_to_line("note-1", "line-1", link).unwrap());
    let table = content_forms::table(vec!["A".to_string()], vec![vec!["1".to_string()]]).unwrap();
    assert!(store.add_content_to_line("note-1", "line-1", table).unwrap());
    let second_link = content_forms::link("https://example.org").unwrap();
    assert!(store
        .add_content_to_line("note-1", "line-1", second_link)
        .unwrap());

    let line = store.find_note("note-1").unwrap().line("line-1").unwrap();
    assert_eq!(line.tags, vec!["link", "table", "link"]);
    let content = line.content.as_ref().unwrap();
    assert_eq!(content.kind(), ContentKind::Link);
    assert_eq!(content.value(), "https://example.org");

    let messages: Vec<String> = store
        .take_notifications()
        .into_iter()
        .map(|notification| notification.message)
        .collect();
    assert_eq!(messages[0], "link added to note!");
}

#[test]
fn add_tag_deduplicates() {
    let mut store = seeded_store();
    assert!(store.add_tag_to_line("note-1", "line-1", "idea").unwrap());
    assert!(!store.add_tag_to_line("note-1", "line-1", "idea").unwrap());
    let line = store.find_note("note-1").unwrap().line("line-1").unwrap();
    assert_eq!(line.tags, vec!["idea"]);
}

#[test]
fn linking_is_directional_and_idempotent() {
    let mut store = store_with_stale_note();
    assert!(store.link_notes("note-stale", "note-target").unwrap());
    assert!(!store.link_notes("note-stale", "note-target").unwrap());
    assert!(!store.link_notes("note-stale", "note-stale").unwrap());

    let source = store.find_note("note-stale").unwrap();
    assert_eq!(source.linked_notes, vec!["note-target"]);
    assert!(store.find_note("note-target").unwrap().linked_notes.is_empty());

    let linked: Vec<&str> = store
        .linked_notes("note-stale")
        .into_iter()
        .map(|note| note.id.as_str())
        .collect();
    assert_eq!(linked, vec!["note-target"]);
    let backlinks: Vec<&str> = store
        .backlinks("note-target")
        .into_iter()
        .map(|note| note.id.as_str())
        .collect();
    assert_eq!(backlinks, vec!["note-stale"]);

    assert!(store.unlink_notes("note-stale", "note-target").unwrap());
    assert!(!store.unlink_notes("note-stale", "note-target").unwrap());
    assert!(store.find_note("note-stale").unwrap().linked_notes.is_empty());
}

#[test]
fn linkable_notes_excludes_self() {
    let store = store_with_stale_note();
    let ids: Vec<&str> = store
        .linkable_notes("note-stale")
        .into_iter()
        .map(|note| note.id.as_str())
        .collect();
    assert_eq!(ids, vec!["note-target"]);
}

#[test]
fn delete_note_clears_current_selection() {
    let mut store = seeded_store();
    store.set_current_note(Some("note-1"));
    assert_eq!(store.current_note().unwrap().id, "note-1");

    assert!(store.delete_note("note-1").unwrap());
    assert!(store.find_note("note-1").is_none());
    assert!(store.current_note().is_none());
    assert_eq!(store.current_notebook().unwrap().id, "notebook-1");
}

#[test]
fn selection_follows_owning_notebook_and_ignores_unknown_ids() {
    let mut store = seeded_store();
    let note_id = store.create_note("notebook-2", "Plan").unwrap().unwrap();
    store.set_current_notebook(Some("notebook-1"));
    assert!(store.current_note().is_none());

    store.set_current_note(Some(&note_id));
    assert_eq!(store.current_notebook().unwrap().id, "notebook-2");

    store.set_current_note(Some("missing"));
    assert_eq!(store.current_note().unwrap().id, note_id);
    store.set_current_notebook(Some("missing"));
    assert_eq!(store.current_notebook().unwrap().id, "notebook-2");

    store.set_current_notebook(None);
    assert!(store.current_notebook().is_none());
    assert!(store.current_note().is_none());
}

#[test]
fn current_note_reflects_mutations_immediately() {
    let mut store = seeded_store();
    store.set_current_note(Some("note-1"));
    store.add_line_to_note("note-1", "third").unwrap();
    assert_eq!(store.current_note().unwrap().lines.len(), 3);
}

#[test]
fn rename_note_rejects_blank_and_trims() {
    let mut store = seeded_store();
    assert!(matches!(
        store.rename_note("note-1", "   "),
        Err(StoreError::BlankTitle)
    ));
    assert!(store.rename_note("note-1", "  Renamed  ").unwrap());
    assert_eq!(store.find_note("note-1").unwrap().title, "Renamed");
    assert!(!store.rename_note("note-1", "Renamed").unwrap());
}

#[test]
fn checklist_items_toggle_at_both_levels() {
    let mut store = seeded_store();
    let content = content_forms::checklist(vec![ChecklistDraftItem {
        text: "Pack".to_string(),
        checked: false,
        children: vec![ChecklistDraftLeaf {
            text: "Socks".to_string(),
            checked: false,
        }],
    }])
    .unwrap();
    let parent_id = content.checklist_items().unwrap()[0].id.clone();
    let child_id = content.checklist_items().unwrap()[0].children()[0].id.clone();
    store.add_content_to_line("note-1", "line-2", content).unwrap();

    let child_path = ChecklistPath::nested(parent_id.clone(), child_id);
    assert!(store
        .toggle_checklist_item("note-1", "line-2", &child_path, true)
        .unwrap());
    assert!(!store
        .toggle_checklist_item("note-1", "line-2", &child_path, true)
        .unwrap());
    assert!(store
        .toggle_checklist_item("note-1", "line-2", &ChecklistPath::top_level(parent_id), true)
        .unwrap());

    let items = store
        .find_note("note-1")
        .unwrap()
        .line("line-2")
        .unwrap()
        .content
        .as_ref()
        .unwrap()
        .checklist_items()
        .unwrap();
    assert!(items[0].checked);
    assert!(items[0].children()[0].checked);
}

#[test]
fn table_edits_keep_table_rectangular() {
    let mut store = seeded_store();
    let table = content_forms::table(
        vec!["Name".to_string(), "Qty".to_string()],
        vec![vec!["apples".to_string(), "3".to_string()]],
    )
    .unwrap();
    store.add_content_to_line("note-1", "line-1", table).unwrap();

    assert!(store
        .update_table(
            "note-1",
            "line-1",
            TableEdit::AddColumn {
                header: "Price".to_string()
            }
        )
        .unwrap());
    assert!(store.update_table("note-1", "line-1", TableEdit::AddRow).unwrap());
    assert!(store
        .update_table(
            "note-1",
            "line-1",
            TableEdit::SetCell {
                row: 1,
                column: 0,
                value: "pears".to_string()
            }
        )
        .unwrap());
    assert!(!store
        .update_table("note-1", "line-1", TableEdit::RemoveRow { index: 9 })
        .unwrap());

    let data = store
        .find_note("note-1")
        .unwrap()
        .line("line-1")
        .unwrap()
        .content
        .as_ref()
        .unwrap()
        .table_data()
        .unwrap();
    assert_eq!(data.headers, vec!["Name", "Qty", "Price"]);
    assert_eq!(data.row_count(), 2);
    assert!(data.is_rectangular());
    assert_eq!(data.rows[1][0], "pears");
}

#[test]
fn table_edit_on_non_table_line_is_noop() {
    let mut store = seeded_store();
    assert!(!store
        .update_table("note-1", "line-1", TableEdit::AddRow)
        .unwrap());
}

#[test]
fn created_notebook_has_title_and_no_notes() {
    let mut store = seeded_store();
    let id = store.create_notebook("Reading", None).unwrap();
    let notebook = store.notebook(&id).unwrap();
    assert_eq!(notebook.title, "Reading");
    assert!(notebook.notes.is_empty());
    assert_eq!(store.current_notebook().unwrap().id, id);
}

#[test]
fn create_then_delete_note_restores_note_list() {
    let mut store = seeded_store();
    let before = store.notebook("notebook-1").unwrap().notes.clone();
    let note_id = store.create_note("notebook-1", "Temporary").unwrap().unwrap();
    assert!(store.delete_note(&note_id).unwrap());
    assert_eq!(store.notebook("notebook-1").unwrap().notes, before);
}

#[test]
fn lines_keep_insertion_order() {
    let mut store = seeded_store();
    let note_id = store.create_note("notebook-2", "Order").unwrap().unwrap();
    for text in ["a", "b", "c"] {
        store.add_line_to_note(&note_id, text).unwrap();
    }
    let texts: Vec<&str> = store
        .find_note(&note_id)
        .unwrap()
        .lines
        .iter()
        .map(|line| line.text.as_str())
        .collect();
    assert_eq!(texts, vec!["a", "b", "c"]);
}

#[test]
fn update_checklist_item_replaces_text_at_both_levels() {
    let mut store = seeded_store();
    let content = content_forms::checklist(vec![ChecklistDraftItem {
        text: "Pack".to_string(),
        checked: false,
        children: vec![ChecklistDraftLeaf {
            text: "Socks".to_string(),
            checked: false,
        }],
    }])
    .unwrap();
    let parent_id = content.checklist_items().unwrap()[0].id.clone();
    let child_id = content.checklist_items().unwrap()[0].children()[0].id.clone();
    store.add_content_to_line("note-1", "line-2", content).unwrap();

    let child_path = ChecklistPath::nested(parent_id.clone(), child_id);
    let mut child = store
        .checklist_item("note-1", "line-2", &child_path)
        .unwrap()
        .clone();
    child.text = "Wool socks".to_string();
    assert!(store
        .update_checklist_item("note-1", "line-2", &child_path, child)
        .unwrap());

    let parent_path = ChecklistPath::top_level(parent_id);
    let mut parent = store
        .checklist_item("note-1", "line-2", &parent_path)
        .unwrap()
        .clone();
    parent.text = "Pack bag".to_string();
    assert!(store
        .update_checklist_item("note-1", "line-2", &parent_path, parent.clone())
        .unwrap());

    let stored = store.checklist_item("note-1", "line-2", &parent_path).unwrap();
    assert_eq!(stored.text, "Pack bag");
    assert_eq!(stored.children()[0].text, "Wool socks");
    assert_eq!(stored, &parent);
}

#[test]
fn update_checklist_item_refuses_second_nesting_level() {
    let mut store = seeded_store();
    let content = content_forms::checklist(vec![ChecklistDraftItem {
        text: "Pack".to_string(),
        checked: false,
        children: vec![ChecklistDraftLeaf {
            text: "Socks".to_string(),
            checked: false,
        }],
    }])
    .unwrap();
    let parent_id = content.checklist_items().unwrap()[0].id.clone();
    let child_id = content.checklist_items().unwrap()[0].children()[0].id.clone();
    store.add_content_to_line("note-1", "line-2", content).unwrap();
    let before = stored_document(&store);

    let child_path = ChecklistPath::nested(parent_id, child_id.clone());
    let deep_child = ChecklistItem {
        id: child_id,
        text: "Socks".to_string(),
        checked: false,
        children: Some(vec![ChecklistItem {
            id: "grandchild".to_string(),
            text: "Left".to_string(),
            checked: false,
            children: None,
        }]),
    };
    assert!(!store
        .update_checklist_item("note-1", "line-2", &child_path, deep_child)
        .unwrap());
    assert_eq!(stored_document(&store), before);
}
