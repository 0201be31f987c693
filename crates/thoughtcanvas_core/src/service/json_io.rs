//! JSON import/export surface.
//!
//! # Responsibility
//! - Export the full notebook collection as pretty-printed JSON.
//! - Parse creation shapes (`{title, description?}`, `{notebookId, title}`),
//!   full note updates and bulk collections, then apply them to the store.
//!
//! # Invariants
//! - Any parse or validation failure returns before the store is touched.
//! - Full-note updates keep the id carried by the JSON document.
//! - Imported notes never link to themselves and their checklists are at most
//!   one level deep.

use crate::model::checklist::within_nesting_limit;
use crate::model::notebook::{LineId, Note, NoteId, Notebook, NotebookId};
use crate::service::store::{NotebookStore, StoreError};
use crate::storage::local_storage::LocalStorage;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Import failure shown next to the JSON text area.
#[derive(Debug)]
pub enum JsonImportError {
    /// Text is not JSON or does not match the expected shape.
    InvalidJson(String),
    /// A required field is missing or blank.
    MissingField(&'static str),
    NotebookNotFound(NotebookId),
    NoteNotFound(NoteId),
    /// The note lists its own id in `linkedNotes`.
    SelfLink(NoteId),
    /// A checklist child carries children of its own.
    ChecklistTooDeep { note_id: NoteId, line_id: LineId },
    Store(StoreError),
}

impl Display for JsonImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(details) => write!(f, "Invalid JSON format: {details}"),
            Self::MissingField(field) => write!(f, "Missing required field: {field}"),
            Self::NotebookNotFound(id) => write!(f, "Notebook not found: {id}"),
            Self::NoteNotFound(id) => write!(f, "Note not found: {id}"),
            Self::SelfLink(id) => write!(f, "Note cannot link to itself: {id}"),
            Self::ChecklistTooDeep { note_id, line_id } => write!(
                f,
                "Checklist items may only nest one level deep: note {note_id}, line {line_id}"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for JsonImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for JsonImportError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for JsonImportError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidJson(value.to_string())
    }
}

/// Minimal notebook creation shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookDraft {
    pub title: String,
    pub description: Option<String>,
}

/// Minimal note creation shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub notebook_id: NotebookId,
    pub title: String,
}

/// Pretty-prints the full collection.
pub fn export_notebooks(notebooks: &[Notebook]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(notebooks)
}

/// Parses `{title, description?}`.
pub fn parse_notebook_draft(json: &str) -> Result<NotebookDraft, JsonImportError> {
    let value: Value = serde_json::from_str(json)?;
    let title = required_text(&value, "title")?;
    let description = value
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);
    Ok(NotebookDraft { title, description })
}

/// Parses `{notebookId, title}`.
pub fn parse_note_draft(json: &str) -> Result<NoteDraft, JsonImportError> {
    let value: Value = serde_json::from_str(json)?;
    let notebook_id = required_text(&value, "notebookId")?;
    let title = required_text(&value, "title")?;
    Ok(NoteDraft { notebook_id, title })
}

/// Parses a full note document.
pub fn parse_note(json: &str) -> Result<Note, JsonImportError> {
    Ok(serde_json::from_str(json)?)
}

/// Parses a full notebook array.
pub fn parse_notebooks(json: &str) -> Result<Vec<Notebook>, JsonImportError> {
    Ok(serde_json::from_str(json)?)
}

/// Creates a notebook from `{title, description?}`.
pub fn import_notebook<S: LocalStorage>(
    store: &mut NotebookStore<S>,
    json: &str,
) -> Result<NotebookId, JsonImportError> {
    let draft = parse_notebook_draft(json)?;
    Ok(store.create_notebook(draft.title, draft.description)?)
}

/// Creates a note from `{notebookId, title}`.
pub fn import_note<S: LocalStorage>(
    store: &mut NotebookStore<S>,
    json: &str,
) -> Result<NoteId, JsonImportError> {
    let draft = parse_note_draft(json)?;
    store
        .create_note(&draft.notebook_id, draft.title)?
        .ok_or(JsonImportError::NotebookNotFound(draft.notebook_id))
}

/// Replaces an existing note in place from its full JSON shape.
pub fn import_note_update<S: LocalStorage>(
    store: &mut NotebookStore<S>,
    json: &str,
) -> Result<NoteId, JsonImportError> {
    let note = parse_note(json)?;
    let note_id = note.id.clone();
    if note.title.trim().is_empty() {
        return Err(JsonImportError::MissingField("title"));
    }
    check_note(&note)?;
    if store.update_note(note)? {
        Ok(note_id)
    } else {
        Err(JsonImportError::NoteNotFound(note_id))
    }
}

/// Replaces the whole collection from a notebook array.
pub fn import_collection<S: LocalStorage>(
    store: &mut NotebookStore<S>,
    json: &str,
) -> Result<usize, JsonImportError> {
    let notebooks = parse_notebooks(json)?;
    for note in notebooks.iter().flat_map(|notebook| notebook.notes.iter()) {
        check_note(note)?;
    }
    let count = notebooks.len();
    store.replace_notebooks(notebooks)?;
    Ok(count)
}

/// Template for the notebook creation shape.
pub fn notebook_template() -> String {
    pretty(&json!({
        "title": "New Notebook Title",
        "description": "Optional notebook description"
    }))
}

/// Template for the note creation shape, targeting `notebook_id` when known.
pub fn note_template(notebook_id: Option<&str>) -> String {
    pretty(&json!({
        "notebookId": notebook_id.unwrap_or("notebook-id-here"),
        "title": "New Note Title"
    }))
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Rejects self-links and checklists nested deeper than one level.
fn check_note(note: &Note) -> Result<(), JsonImportError> {
    if note.links_to(&note.id) {
        return Err(JsonImportError::SelfLink(note.id.clone()));
    }
    let too_deep = note.lines.iter().find(|line| {
        line.content
            .as_ref()
            .and_then(|content| content.checklist_items())
            .is_some_and(|items| !within_nesting_limit(items))
    });
    match too_deep {
        Some(line) => Err(JsonImportError::ChecklistTooDeep {
            note_id: note.id.clone(),
            line_id: line.id.clone(),
        }),
        None => Ok(()),
    }
}

fn required_text(value: &Value, field: &'static str) -> Result<String, JsonImportError> {
    match value.get(field).and_then(Value::as_str).map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(JsonImportError::MissingField(field)),
    }
}
