//! Notebook/note/line domain model.
//!
//! # Responsibility
//! - Define the canonical notebook tree shared by store, persistence and UI.
//! - Generate prefixed ids and timestamps for newly created entities.
//!
//! # Invariants
//! - Ids are unique within their containing collection (not defensively checked).
//! - A `Line` carries at most one `ContentItem`.
//! - `Note::linked_notes` never contains the note's own id.
//! - Serialized field names are camelCase and must round-trip losslessly.

use crate::model::content::ContentItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wall-clock timestamp stored as RFC 3339 text.
pub type Timestamp = DateTime<Utc>;
/// Identifier of a notebook, e.g. `notebook-1718000000000-k3j9x0a`.
pub type NotebookId = String;
/// Identifier of a note.
pub type NoteId = String;
/// Identifier of a note line.
pub type LineId = String;

const ID_SUFFIX_LEN: usize = 7;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Top-level container for related notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    pub id: NotebookId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    pub created_at: Timestamp,
}

impl Notebook {
    /// Creates an empty notebook with a generated id.
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: new_id("notebook"),
            title: title.into(),
            description,
            notes: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Returns the note with `note_id` if this notebook owns it.
    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == note_id)
    }

    /// Returns whether this notebook owns the note with `note_id`.
    pub fn contains_note(&self, note_id: &str) -> bool {
        self.notes.iter().any(|note| note.id == note_id)
    }
}

/// A titled sequence of lines; the unit of cross-linking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    #[serde(default)]
    pub lines: Vec<Line>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Outgoing links only. Linking A to B never touches B.
    #[serde(default)]
    pub linked_notes: Vec<NoteId>,
}

impl Note {
    /// Creates an empty note with a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id("note"),
            title: title.into(),
            lines: Vec::new(),
            created_at: now,
            updated_at: now,
            linked_notes: Vec::new(),
        }
    }

    /// Returns the line with `line_id`.
    pub fn line(&self, line_id: &str) -> Option<&Line> {
        self.lines.iter().find(|line| line.id == line_id)
    }

    /// Refreshes `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Returns whether this note links to `target_id`.
    pub fn links_to(&self, target_id: &str) -> bool {
        self.linked_notes.iter().any(|id| id == target_id)
    }
}

/// One unit of note text, optionally carrying one rich-content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentItem>,
    /// Ordered tag list; content kinds accumulate here with duplicates.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Line {
    /// Creates a plain text line with no content and no tags.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_id("line"),
            text: text.into(),
            content: None,
            tags: Vec::new(),
        }
    }

    /// Returns whether `tag` is already present.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|current| current == tag)
    }
}

/// Generates `"{prefix}-{epoch_ms}-{7 base36 chars}"`.
///
/// Collisions are not checked; the random suffix makes them unlikely enough
/// for single-user local data.
pub fn new_id(prefix: &str) -> String {
    format!(
        "{prefix}-{}-{}",
        Utc::now().timestamp_millis(),
        random_suffix()
    )
}

fn random_suffix() -> String {
    let mut value = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(ID_SUFFIX_LEN);
    for _ in 0..ID_SUFFIX_LEN {
        suffix.push(char::from(BASE36[(value % 36) as usize]));
        value /= 36;
    }
    suffix
}

#[cfg(test)]
mod tests {
    use super::{new_id, Line, Note, Notebook};

    #[test]
    fn new_id_has_prefix_timestamp_and_suffix() {
        let id = new_id("note");
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "note");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 7);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn new_ids_differ() {
        assert_ne!(new_id("line"), new_id("line"));
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let notebook = Notebook::new("Work", None);
        let value = serde_json::to_value(&notebook).unwrap();
        assert!(value.get("description").is_none());
        assert!(value.get("createdAt").is_some());

        let line = Line::new("plain");
        let value = serde_json::to_value(&line).unwrap();
        assert!(value.get("content").is_none());
        assert_eq!(value["tags"], serde_json::json!([]));
    }

    #[test]
    fn note_uses_camel_case_field_names() {
        let note = Note::new("First");
        let value = serde_json::to_value(&note).unwrap();
        for key in ["id", "title", "lines", "createdAt", "updatedAt", "linkedNotes"] {
            assert!(value.get(key).is_some(), "missing `{key}`");
        }
    }
}
