//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose notebook, note, line and content operations to Dart via FRB.
//! - Own the process-wide notebook store and open it lazily on first use.
//! - Own one drawing canvas fed by pointer events from the Flutter surface.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every mutation returns an `ActionResponse`; store notifications become
//!   its `message`.

use log::warn;
use std::sync::{Mutex, OnceLock};
use thoughtcanvas_core::model::checklist::ChecklistPath;
use thoughtcanvas_core::render::markdown::markdown_to_html;
use thoughtcanvas_core::service::{content_forms, json_io};
use thoughtcanvas_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    render_note, resolve_db_path, ContentBody, ContentItem, DrawingCanvas, NotebookStore,
    SqliteLocalStorage, TableEdit, ViewMode,
};

type Store = NotebookStore<SqliteLocalStorage>;

static STORE: OnceLock<Mutex<Option<Store>>> = OnceLock::new();
static CANVAS: OnceLock<Mutex<DrawingCanvas>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
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
/// Returns an empty string on success and the error message otherwise.
/// Repeating the same `level + log_dir` is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Notebook row for the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub note_count: u32,
}

/// Note row for the notebook view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: String,
    pub title: String,
    /// Last update, epoch milliseconds.
    pub updated_at_ms: i64,
    pub line_count: u32,
    pub linked_note_ids: Vec<String>,
}

/// Current notebook/note selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub notebook_id: Option<String>,
    pub note_id: Option<String>,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the operation changed anything.
    pub ok: bool,
    /// Id of the created entity, when the operation creates one.
    pub id: Option<String>,
    /// Human-readable message for a toast or inline error.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// One structural table edit; indices are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEditAction {
    AddColumn { header: String },
    RemoveColumn { index: u32 },
    AddRow,
    RemoveRow { index: u32 },
    SetHeader { index: u32, value: String },
    SetCell { row: u32, column: u32, value: String },
}

impl From<TableEditAction> for TableEdit {
    fn from(action: TableEditAction) -> Self {
        match action {
            TableEditAction::AddColumn { header } => TableEdit::AddColumn { header },
            TableEditAction::RemoveColumn { index } => TableEdit::RemoveColumn {
                index: index as usize,
            },
            TableEditAction::AddRow => TableEdit::AddRow,
            TableEditAction::RemoveRow { index } => TableEdit::RemoveRow {
                index: index as usize,
            },
            TableEditAction::SetHeader { index, value } => TableEdit::SetHeader {
                index: index as usize,
                value,
            },
            TableEditAction::SetCell { row, column, value } => TableEdit::SetCell {
                row: row as usize,
                column: column as usize,
                value,
            },
        }
    }
}

/// Drawing surface snapshot after a pointer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawingState {
    pub width: u32,
    pub height: u32,
    pub brush_size: u32,
    pub drawing: bool,
    /// PNG data URL exported by the last finished stroke.
    pub pending_export: Option<String>,
}

enum Outcome {
    Applied {
        id: Option<String>,
        message: &'static str,
    },
    Skipped(&'static str),
}

impl Outcome {
    fn applied(message: &'static str) -> Self {
        Self::Applied { id: None, message }
    }

    fn from_flag(applied: bool, message: &'static str, skipped: &'static str) -> Self {
        if applied {
            Self::applied(message)
        } else {
            Self::Skipped(skipped)
        }
    }
}

/// Lists all notebooks in display order.
#[flutter_rust_bridge::frb(sync)]
pub fn notebook_list() -> Vec<NotebookItem> {
    with_store(|store| {
        Ok(store
            .notebooks()
            .iter()
            .map(|notebook| NotebookItem {
                id: notebook.id.clone(),
                title: notebook.title.clone(),
                description: notebook.description.clone(),
                note_count: count(notebook.notes.len()),
            })
            .collect())
    })
    .unwrap_or_else(|err| {
        warn!("event=notebook_list module=ffi status=error error={err}");
        Vec::new()
    })
}

/// Lists notes of one notebook; unknown ids yield an empty list.
#[flutter_rust_bridge::frb(sync)]
pub fn note_list(notebook_id: String) -> Vec<NoteItem> {
    with_store(|store| {
        Ok(store
            .notebook(&notebook_id)
            .map(|notebook| {
                notebook
                    .notes
                    .iter()
                    .map(|note| NoteItem {
                        id: note.id.clone(),
                        title: note.title.clone(),
                        updated_at_ms: note.updated_at.timestamp_millis(),
                        line_count: count(note.lines.len()),
                        linked_note_ids: note.linked_notes.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    })
    .unwrap_or_else(|err| {
        warn!("event=note_list module=ffi status=error error={err}");
        Vec::new()
    })
}

/// Returns the note as pretty JSON, ready for the JSON editor.
#[flutter_rust_bridge::frb(sync)]
pub fn note_json(note_id: String) -> Option<String> {
    with_store(|store| {
        store
            .find_note(&note_id)
            .map(|note| serde_json::to_string_pretty(note).map_err(|err| err.to_string()))
            .transpose()
    })
    .ok()
    .flatten()
}

/// Returns the note rendered as text; `detail` expands rich content.
#[flutter_rust_bridge::frb(sync)]
pub fn note_render(note_id: String, detail: bool) -> Option<String> {
    let mode = if detail {
        ViewMode::Detail
    } else {
        ViewMode::Inline
    };
    with_store(|store| Ok(store.find_note(&note_id).map(|note| render_note(note, mode))))
        .ok()
        .flatten()
}

#[flutter_rust_bridge::frb(sync)]
pub fn selection_get() -> SelectionState {
    with_store(|store| {
        Ok(SelectionState {
            notebook_id: store.current_notebook().map(|notebook| notebook.id.clone()),
            note_id: store.current_note().map(|note| note.id.clone()),
        })
    })
    .unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn selection_set_notebook(notebook_id: Option<String>) -> SelectionState {
    let _ = with_store(|store| {
        store.set_current_notebook(notebook_id.as_deref());
        Ok(())
    });
    selection_get()
}

#[flutter_rust_bridge::frb(sync)]
pub fn selection_set_note(note_id: Option<String>) -> SelectionState {
    let _ = with_store(|store| {
        store.set_current_note(note_id.as_deref());
        Ok(())
    });
    selection_get()
}

#[flutter_rust_bridge::frb(sync)]
pub fn notebook_create(title: String, description: Option<String>) -> ActionResponse {
    let title = title.trim().to_string();
    if title.is_empty() {
        return ActionResponse::failure("Notebook title is required");
    }
    let description = description
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    run_action("notebook_create", |store| {
        let id = store
            .create_notebook(title, description)
            .map_err(|err| err.to_string())?;
        Ok(Outcome::Applied {
            id: Some(id),
            message: "Notebook created!",
        })
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_create(notebook_id: String, title: String) -> ActionResponse {
    let title = title.trim().to_string();
    if title.is_empty() {
        return ActionResponse::failure("Note title is required");
    }
    run_action("note_create", |store| {
        match store
            .create_note(&notebook_id, title)
            .map_err(|err| err.to_string())?
        {
            Some(id) => Ok(Outcome::Applied {
                id: Some(id),
                message: "Note created!",
            }),
            None => Ok(Outcome::Skipped("Notebook not found")),
        }
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_rename(note_id: String, title: String) -> ActionResponse {
    run_action("note_rename", |store| {
        let renamed = store
            .rename_note(&note_id, &title)
            .map_err(|err| err.to_string())?;
        Ok(Outcome::from_flag(renamed, "Title updated!", "Title unchanged"))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(note_id: String) -> ActionResponse {
    run_action("note_delete", |store| {
        let deleted = store.delete_note(&note_id).map_err(|err| err.to_string())?;
        Ok(Outcome::from_flag(deleted, "Note deleted!", "Note not found"))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn line_add(note_id: String, text: String) -> ActionResponse {
    run_action("line_add", |store| {
        match store
            .add_line_to_note(&note_id, text)
            .map_err(|err| err.to_string())?
        {
            Some(id) => Ok(Outcome::Applied {
                id: Some(id),
                message: "Line added",
            }),
            None => Ok(Outcome::Skipped("Note not found")),
        }
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn line_update(note_id: String, line_id: String, text: String) -> ActionResponse {
    run_action("line_update", |store| {
        let updated = store
            .update_line(&note_id, &line_id, &text)
            .map_err(|err| err.to_string())?;
        Ok(Outcome::from_flag(updated, "Line updated", "Line not found"))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn line_delete(note_id: String, line_id: String) -> ActionResponse {
    run_action("line_delete", |store| {
        let deleted = store
            .delete_line(&note_id, &line_id)
            .map_err(|err| err.to_string())?;
        Ok(Outcome::from_flag(deleted, "Line deleted", "Line not found"))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn line_tag_add(note_id: String, line_id: String, tag: String) -> ActionResponse {
    let tag = tag.trim().to_string();
    if tag.is_empty() {
        return ActionResponse::failure("Tag is required");
    }
    run_action("line_tag_add", |store| {
        let added = store
            .add_tag_to_line(&note_id, &line_id, &tag)
            .map_err(|err| err.to_string())?;
        Ok(Outcome::from_flag(added, "Tag added", "Tag already present or line not found"))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn content_add_link(note_id: String, line_id: String, url: String) -> ActionResponse {
    add_content(note_id, line_id, content_forms::link(&url))
}

#[flutter_rust_bridge::frb(sync)]
pub fn content_add_markdown(note_id: String, line_id: String, source: String) -> ActionResponse {
    add_content(note_id, line_id, content_forms::markdown(&source))
}

#[flutter_rust_bridge::frb(sync)]
pub fn content_add_drawing(note_id: String, line_id: String, data_url: String) -> ActionResponse {
    add_content(note_id, line_id, content_forms::drawing(&data_url))
}

/// Attaches an uploaded file; `image/*` uploads are stored inline as data URLs.
#[flutter_rust_bridge::frb(sync)]
pub fn content_add_upload(
    note_id: String,
    line_id: String,
    filename: String,
    mime_type: String,
    bytes: Vec<u8>,
) -> ActionResponse {
    add_content(
        note_id,
        line_id,
        content_forms::upload(&filename, &mime_type, &bytes),
    )
}

/// Attaches a checklist from `[{text, checked?, children?}]`.
#[flutter_rust_bridge::frb(sync)]
pub fn content_add_checklist_json(note_id: String, line_id: String, json: String) -> ActionResponse {
    add_content(note_id, line_id, content_forms::checklist_from_json(&json))
}

/// Attaches a table from `{headers, rows}`.
#[flutter_rust_bridge::frb(sync)]
pub fn content_add_table_json(note_id: String, line_id: String, json: String) -> ActionResponse {
    add_content(note_id, line_id, content_forms::table_from_json(&json))
}

/// Sets one checklist item's checked flag.
///
/// `item_path` is `[item_id]` for top-level items or `[parent_id, child_id]`.
#[flutter_rust_bridge::frb(sync)]
pub fn checklist_toggle(
    note_id: String,
    line_id: String,
    item_path: Vec<String>,
    checked: bool,
) -> ActionResponse {
    let Some(path) = ChecklistPath::from_ids(item_path) else {
        return ActionResponse::failure("Checklist item path is empty");
    };
    run_action("checklist_toggle", |store| {
        let toggled = store
            .toggle_checklist_item(&note_id, &line_id, &path, checked)
            .map_err(|err| err.to_string())?;
        Ok(Outcome::from_flag(toggled, "Checklist updated", "Checklist item unchanged"))
    })
}

/// Changes the text of one checklist item, keeping its flag and children.
#[flutter_rust_bridge::frb(sync)]
pub fn checklist_update(
    note_id: String,
    line_id: String,
    item_path: Vec<String>,
    text: String,
) -> ActionResponse {
    let Some(path) = ChecklistPath::from_ids(item_path) else {
        return ActionResponse::failure("Checklist item path is empty");
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        return ActionResponse::failure("Checklist item text is required");
    }
    run_action("checklist_update", |store| {
        let Some(mut item) = store.checklist_item(&note_id, &line_id, &path).cloned() else {
            return Ok(Outcome::Skipped("Checklist item not found"));
        };
        item.text = text;
        let updated = store
            .update_checklist_item(&note_id, &line_id, &path, item)
            .map_err(|err| err.to_string())?;
        Ok(Outcome::from_flag(updated, "Checklist updated", "Checklist item unchanged"))
    })
}

/// Applies one edit to the table attached to a line.
#[flutter_rust_bridge::frb(sync)]
pub fn table_edit(note_id: String, line_id: String, action: TableEditAction) -> ActionResponse {
    run_action("table_edit", |store| {
        let updated = store
            .update_table(&note_id, &line_id, action.into())
            .map_err(|err| err.to_string())?;
        Ok(Outcome::from_flag(
            updated,
            "Table updated",
            "No table on that line or index out of range",
        ))
    })
}

/// Full markdown of a line rendered to HTML for the overlay view.
#[flutter_rust_bridge::frb(sync)]
pub fn markdown_html(note_id: String, line_id: String) -> Option<String> {
    with_store(|store| {
        Ok(store
            .find_note(&note_id)
            .and_then(|note| note.line(&line_id))
            .and_then(|line| line.content.as_ref())
            .and_then(|content| match &content.body {
                ContentBody::Markdown { source } => Some(markdown_to_html(source)),
                _ => None,
            }))
    })
    .ok()
    .flatten()
}

/// Starts a fresh blank canvas with default brush and colour.
#[flutter_rust_bridge::frb(sync)]
pub fn drawing_reset() -> DrawingState {
    with_canvas(|canvas| *canvas = DrawingCanvas::new())
}

#[flutter_rust_bridge::frb(sync)]
pub fn drawing_set_brush_size(size: u32) -> DrawingState {
    with_canvas(|canvas| canvas.set_brush_size(size))
}

/// Sets the stroke colour from `#rrggbb`.
#[flutter_rust_bridge::frb(sync)]
pub fn drawing_set_color(hex: String) -> ActionResponse {
    let mut result = Ok(());
    with_canvas(|canvas| result = canvas.set_color(&hex));
    match result {
        Ok(()) => ActionResponse::success("Colour updated", None),
        Err(err) => ActionResponse::failure(err.to_string()),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn drawing_pointer_down(x: f32, y: f32) -> DrawingState {
    with_canvas(|canvas| canvas.pointer_down(x, y))
}

#[flutter_rust_bridge::frb(sync)]
pub fn drawing_pointer_move(x: f32, y: f32) -> DrawingState {
    with_canvas(|canvas| canvas.pointer_move(x, y))
}

/// Ends the stroke (pointer up or leave) and exports the bitmap.
#[flutter_rust_bridge::frb(sync)]
pub fn drawing_pointer_up() -> DrawingState {
    with_canvas(|canvas| {
        if let Err(err) = canvas.pointer_up() {
            warn!("event=drawing_export module=ffi status=error error={err}");
        }
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn drawing_clear() -> DrawingState {
    with_canvas(DrawingCanvas::clear)
}

/// Attaches the last exported drawing to a line; the canvas resets once it
/// is stored.
#[flutter_rust_bridge::frb(sync)]
pub fn drawing_save(note_id: String, line_id: String) -> ActionResponse {
    let mut exported = None;
    with_canvas(|canvas| exported = canvas.pending_export().map(str::to_string));
    let Some(data_url) = exported else {
        return ActionResponse::failure("Nothing has been drawn yet");
    };
    let response = add_content(note_id, line_id, content_forms::drawing(&data_url));
    if response.ok {
        drawing_reset();
    }
    response
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_link(source_id: String, target_id: String) -> ActionResponse {
    run_action("note_link", |store| {
        let linked = store
            .link_notes(&source_id, &target_id)
            .map_err(|err| err.to_string())?;
        Ok(Outcome::from_flag(linked, "Notes linked!", "Notes already linked"))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_unlink(source_id: String, target_id: String) -> ActionResponse {
    run_action("note_unlink", |store| {
        let unlinked = store
            .unlink_notes(&source_id, &target_id)
            .map_err(|err| err.to_string())?;
        Ok(Outcome::from_flag(unlinked, "Notes unlinked!", "Notes were not linked"))
    })
}

/// Pretty-printed JSON of the whole collection.
#[flutter_rust_bridge::frb(sync)]
pub fn notebooks_export() -> String {
    with_store(|store| json_io::export_notebooks(store.notebooks()).map_err(|err| err.to_string()))
        .unwrap_or_else(|err| {
            warn!("event=notebooks_export module=ffi status=error error={err}");
            "[]".to_string()
        })
}

/// JSON editor template; `notebook_id` pre-fills the note shape.
#[flutter_rust_bridge::frb(sync)]
pub fn json_template(kind: String, notebook_id: Option<String>) -> String {
    match kind.as_str() {
        "note" => json_io::note_template(notebook_id.as_deref()),
        _ => json_io::notebook_template(),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn json_import_notebook(json: String) -> ActionResponse {
    run_action("json_import_notebook", |store| {
        let id = json_io::import_notebook(store, &json).map_err(|err| err.to_string())?;
        Ok(Outcome::Applied {
            id: Some(id),
            message: "Notebook created!",
        })
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn json_import_note(json: String) -> ActionResponse {
    run_action("json_import_note", |store| {
        let id = json_io::import_note(store, &json).map_err(|err| err.to_string())?;
        Ok(Outcome::Applied {
            id: Some(id),
            message: "Note created!",
        })
    })
}

/// Replaces an existing note with the full note JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn json_import_note_update(json: String) -> ActionResponse {
    run_action("json_import_note_update", |store| {
        let id = json_io::import_note_update(store, &json).map_err(|err| err.to_string())?;
        Ok(Outcome::Applied {
            id: Some(id),
            message: "Note updated!",
        })
    })
}

/// Replaces the whole collection with a notebook array.
#[flutter_rust_bridge::frb(sync)]
pub fn json_import_collection(json: String) -> ActionResponse {
    run_action("json_import_collection", |store| {
        json_io::import_collection(store, &json).map_err(|err| err.to_string())?;
        Ok(Outcome::applied("Notebooks imported!"))
    })
}

fn add_content<E: std::fmt::Display>(
    note_id: String,
    line_id: String,
    content: Result<ContentItem, E>,
) -> ActionResponse {
    let content = match content {
        Ok(content) => content,
        Err(err) => return ActionResponse::failure(err.to_string()),
    };
    run_action("content_add", |store| {
        let added = store
            .add_content_to_line(&note_id, &line_id, content)
            .map_err(|err| err.to_string())?;
        Ok(Outcome::from_flag(added, "Content added", "Line not found"))
    })
}

fn run_action(
    event: &'static str,
    action: impl FnOnce(&mut Store) -> Result<Outcome, String>,
) -> ActionResponse {
    let result = with_store(|store| {
        let outcome = action(store);
        // Drain even on failure so stale messages never leak into the next call.
        let notifications = store.take_notifications();
        outcome.map(|outcome| (outcome, notifications))
    });

    match result {
        Ok((Outcome::Applied { id, message }, notifications)) => {
            let message = if notifications.is_empty() {
                message.to_string()
            } else {
                notifications
                    .into_iter()
                    .map(|notification| notification.message)
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            ActionResponse::success(message, id)
        }
        Ok((Outcome::Skipped(reason), _)) => ActionResponse::failure(reason),
        Err(err) => {
            warn!("event={event} module=ffi status=error error={err}");
            ActionResponse::failure(format!("{event} failed: {err}"))
        }
    }
}

fn with_store<T>(f: impl FnOnce(&mut Store) -> Result<T, String>) -> Result<T, String> {
    let slot = STORE.get_or_init(|| Mutex::new(None));
    let mut guard = slot
        .lock()
        .map_err(|_| "notebook store lock poisoned".to_string())?;
    if guard.is_none() {
        let db_path = resolve_db_path();
        let storage = SqliteLocalStorage::open(&db_path)
            .map_err(|err| format!("notebook DB open failed: {err}"))?;
        let store =
            NotebookStore::open(storage).map_err(|err| format!("notebook load failed: {err}"))?;
        *guard = Some(store);
    }
    match guard.as_mut() {
        Some(store) => f(store),
        None => Err("notebook store unavailable".to_string()),
    }
}

fn with_canvas(f: impl FnOnce(&mut DrawingCanvas)) -> DrawingState {
    let slot = CANVAS.get_or_init(|| Mutex::new(DrawingCanvas::new()));
    let mut canvas = match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    f(&mut *canvas);
    DrawingState {
        width: canvas.width(),
        height: canvas.height(),
        brush_size: canvas.brush_size(),
        drawing: canvas.is_drawing(),
        pending_export: canvas.pending_export().map(str::to_string),
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
