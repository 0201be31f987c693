//! Notebook store: the single owner of notebook/note state.
//!
//! # Responsibility
//! - Hold the notebook collection plus the current notebook/note selection.
//! - Expose the enumerated mutation set; every applied mutation is persisted.
//! - Queue user-facing notifications for the presentation layer.
//!
//! # Invariants
//! - The current selection is stored as ids and resolved by lookup, so it can
//!   never diverge from the canonical collection.
//! - A lookup miss is a silent no-op: nothing changes and nothing is written.
//! - `Note::updated_at` is refreshed by every applied line/content/link change.
//! - Note links are directional; only the source note is modified.

use crate::model::checklist::{find_at_path, replace_at_path, ChecklistItem, ChecklistPath};
use crate::model::content::{ContentBody, ContentItem};
use crate::model::notebook::{Line, LineId, Note, NoteId, Notebook, NotebookId};
use crate::model::table::TableEdit;
use crate::storage::local_storage::LocalStorage;
use crate::storage::persistence::{load_notebooks, save_notebooks, PersistenceError};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation failure.
#[derive(Debug)]
pub enum StoreError {
    /// Title is blank after trim.
    BlankTitle,
    /// Loading or writing the collection failed.
    Persistence(PersistenceError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::BlankTitle => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

/// User-facing success message raised by a store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
}

/// Owner of the notebook collection and current selection.
pub struct NotebookStore<S: LocalStorage> {
    storage: S,
    notebooks: Vec<Notebook>,
    current_notebook_id: Option<NotebookId>,
    current_note_id: Option<NoteId>,
    notifications: Vec<Notification>,
}

impl<S: LocalStorage> NotebookStore<S> {
    /// Loads (or seeds) the collection and selects the first notebook.
    pub fn open(mut storage: S) -> StoreResult<Self> {
        let notebooks = load_notebooks(&mut storage)?;
        let current_notebook_id = notebooks.first().map(|notebook| notebook.id.clone());
        Ok(Self {
            storage,
            notebooks,
            current_notebook_id,
            current_note_id: None,
            notifications: Vec::new(),
        })
    }

    pub fn notebooks(&self) -> &[Notebook] {
        &self.notebooks
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn notebook(&self, notebook_id: &str) -> Option<&Notebook> {
        self.notebooks
            .iter()
            .find(|notebook| notebook.id == notebook_id)
    }

    pub fn current_notebook(&self) -> Option<&Notebook> {
        self.current_notebook_id
            .as_deref()
            .and_then(|id| self.notebook(id))
    }

    pub fn current_note(&self) -> Option<&Note> {
        self.current_note_id
            .as_deref()
            .and_then(|id| self.find_note(id))
    }

    /// Selects a notebook by id (or clears the selection) and clears the
    /// current note. Unknown ids are ignored.
    pub fn set_current_notebook(&mut self, notebook_id: Option<&str>) {
        match notebook_id {
            Some(id) if self.notebook(id).is_none() => {
                debug!("event=select_notebook module=store status=skipped reason=not_found");
            }
            Some(id) => {
                self.current_notebook_id = Some(id.to_string());
                self.current_note_id = None;
            }
            None => {
                self.current_notebook_id = None;
                self.current_note_id = None;
            }
        }
    }

    /// Selects a note by id (or clears it). Selecting a note also selects the
    /// notebook that owns it. Unknown ids are ignored.
    pub fn set_current_note(&mut self, note_id: Option<&str>) {
        let Some(id) = note_id else {
            self.current_note_id = None;
            return;
        };
        match self.notebook_of(id).map(|notebook| notebook.id.clone()) {
            Some(notebook_id) => {
                self.current_notebook_id = Some(notebook_id);
                self.current_note_id = Some(id.to_string());
            }
            None => {
                debug!("event=select_note module=store status=skipped reason=not_found");
            }
        }
    }

    /// Drains queued notifications in emission order.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Finds a note in any notebook.
    pub fn find_note(&self, note_id: &str) -> Option<&Note> {
        self.notebooks
            .iter()
            .find_map(|notebook| notebook.note(note_id))
    }

    /// Returns the notebook owning `note_id`.
    pub fn notebook_of(&self, note_id: &str) -> Option<&Notebook> {
        self.notebooks
            .iter()
            .find(|notebook| notebook.contains_note(note_id))
    }

    /// Resolves outgoing links of `note_id`; dangling ids are skipped.
    pub fn linked_notes(&self, note_id: &str) -> Vec<&Note> {
        self.find_note(note_id)
            .map(|note| {
                note.linked_notes
                    .iter()
                    .filter_map(|id| self.find_note(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Notes that link to `note_id`.
    pub fn backlinks(&self, note_id: &str) -> Vec<&Note> {
        self.all_notes()
            .filter(|note| note.links_to(note_id))
            .collect()
    }

    /// Every note except `note_id` itself, in notebook order.
    pub fn linkable_notes(&self, note_id: &str) -> Vec<&Note> {
        self.all_notes().filter(|note| note.id != note_id).collect()
    }

    fn all_notes(&self) -> impl Iterator<Item = &Note> {
        self.notebooks.iter().flat_map(|notebook| notebook.notes.iter())
    }

    /// Appends a new notebook and makes it current.
    pub fn create_notebook(
        &mut self,
        title: impl Into<String>,
        description: Option<String>,
    ) -> StoreResult<NotebookId> {
        let notebook = Notebook::new(title, description);
        let notebook_id = notebook.id.clone();
        self.notebooks.push(notebook);
        self.current_notebook_id = Some(notebook_id.clone());
        self.current_note_id = None;
        self.persist()?;

        info!("event=notebook_create module=store status=ok notebook_id={notebook_id}");
        self.notify("Notebook created!");
        Ok(notebook_id)
    }

    /// Appends a new note to `notebook_id` and makes it current.
    ///
    /// Returns `None` when the notebook does not exist.
    pub fn create_note(
        &mut self,
        notebook_id: &str,
        title: impl Into<String>,
    ) -> StoreResult<Option<NoteId>> {
        let Some(notebook) = self
            .notebooks
            .iter_mut()
            .find(|notebook| notebook.id == notebook_id)
        else {
            debug!("event=note_create module=store status=skipped reason=notebook_not_found");
            return Ok(None);
        };

        let note = Note::new(title);
        let note_id = note.id.clone();
        notebook.notes.push(note);
        self.current_notebook_id = Some(notebook_id.to_string());
        self.current_note_id = Some(note_id.clone());
        self.persist()?;

        info!(
            "event=note_create module=store status=ok notebook_id={notebook_id} note_id={note_id}"
        );
        self.notify("Note created!");
        Ok(Some(note_id))
    }

    /// Replaces the note with the same id, refreshing `updated_at`.
    pub fn update_note(&mut self, note: Note) -> StoreResult<bool> {
        let note_id = note.id.clone();
        self.mutate_note(&note_id, "note_update", |slot| {
            *slot = note;
            true
        })
    }

    /// Renames a note; blank titles are rejected.
    pub fn rename_note(&mut self, note_id: &str, title: &str) -> StoreResult<bool> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(StoreError::BlankTitle);
        }
        let Some(mut note) = self.find_note(note_id).cloned() else {
            return Ok(false);
        };
        if note.title == trimmed {
            return Ok(false);
        }
        note.title = trimmed.to_string();
        let updated = self.update_note(note)?;
        if updated {
            self.notify("Title updated!");
        }
        Ok(updated)
    }

    /// Removes a note from whichever notebook owns it.
    pub fn delete_note(&mut self, note_id: &str) -> StoreResult<bool> {
        let Some(notebook) = self
            .notebooks
            .iter_mut()
            .find(|notebook| notebook.contains_note(note_id))
        else {
            debug!("event=note_delete module=store status=skipped reason=note_not_found");
            return Ok(false);
        };

        notebook.notes.retain(|note| note.id != note_id);
        if self.current_note_id.as_deref() == Some(note_id) {
            self.current_note_id = None;
        }
        self.persist()?;

        info!("event=note_delete module=store status=ok note_id={note_id}");
        self.notify("Note deleted!");
        Ok(true)
    }

    /// Appends a plain line to the note. Returns the new line id.
    pub fn add_line_to_note(
        &mut self,
        note_id: &str,
        text: impl Into<String>,
    ) -> StoreResult<Option<LineId>> {
        let line = Line::new(text);
        let line_id = line.id.clone();
        let added = self.mutate_note(note_id, "line_add", |note| {
            note.lines.push(line);
            true
        })?;
        Ok(added.then_some(line_id))
    }

    /// Replaces the text of one line.
    pub fn update_line(&mut self, note_id: &str, line_id: &str, text: &str) -> StoreResult<bool> {
        self.mutate_line(note_id, line_id, "line_update", |line| {
            line.text = text.to_string();
            true
        })
    }

    /// Removes one line.
    pub fn delete_line(&mut self, note_id: &str, line_id: &str) -> StoreResult<bool> {
        self.mutate_note(note_id, "line_delete", |note| {
            let before = note.lines.len();
            note.lines.retain(|line| line.id != line_id);
            note.lines.len() != before
        })
    }

    /// Sets the line's content slot and appends the content kind to its tags.
    ///
    /// Tags accumulate here without deduplication.
    pub fn add_content_to_line(
        &mut self,
        note_id: &str,
        line_id: &str,
        content: ContentItem,
    ) -> StoreResult<bool> {
        let kind = content.kind();
        let applied = self.mutate_line(note_id, line_id, "content_add", |line| {
            line.tags.push(kind.as_str().to_string());
            line.content = Some(content);
            true
        })?;
        if applied {
            self.notify(format!("{kind} added to note!"));
        }
        Ok(applied)
    }

    /// Appends `tag` unless the line already carries it.
    pub fn add_tag_to_line(&mut self, note_id: &str, line_id: &str, tag: &str) -> StoreResult<bool> {
        self.mutate_line(note_id, line_id, "tag_add", |line| {
            if line.has_tag(tag) {
                return false;
            }
            line.tags.push(tag.to_string());
            true
        })
    }

    /// Adds `target_id` to the source note's outgoing links.
    ///
    /// Self-links and already-present links are no-ops; the target note is
    /// never modified.
    pub fn link_notes(&mut self, source_id: &str, target_id: &str) -> StoreResult<bool> {
        if source_id == target_id {
            return Ok(false);
        }
        let linked = self.mutate_note(source_id, "note_link", |note| {
            if note.links_to(target_id) {
                return false;
            }
            note.linked_notes.push(target_id.to_string());
            true
        })?;
        if linked {
            self.notify("Notes linked!");
        }
        Ok(linked)
    }

    /// Removes `target_id` from the source note's outgoing links.
    pub fn unlink_notes(&mut self, source_id: &str, target_id: &str) -> StoreResult<bool> {
        if source_id == target_id {
            return Ok(false);
        }
        let unlinked = self.mutate_note(source_id, "note_unlink", |note| {
            let before = note.linked_notes.len();
            note.linked_notes.retain(|id| id != target_id);
            note.linked_notes.len() != before
        })?;
        if unlinked {
            self.notify("Notes unlinked!");
        }
        Ok(unlinked)
    }

    /// Checklist item addressed by `path` in the line's content.
    pub fn checklist_item(
        &self,
        note_id: &str,
        line_id: &str,
        path: &ChecklistPath,
    ) -> Option<&ChecklistItem> {
        self.find_note(note_id)
            .and_then(|note| note.line(line_id))
            .and_then(|line| line.content.as_ref())
            .and_then(ContentItem::checklist_items)
            .and_then(|items| find_at_path(items, path))
    }

    /// Replaces the checklist item addressed by `path` in the line's content.
    ///
    /// A replacement that would nest deeper than one level is refused.
    pub fn update_checklist_item(
        &mut self,
        note_id: &str,
        line_id: &str,
        path: &ChecklistPath,
        updated_item: ChecklistItem,
    ) -> StoreResult<bool> {
        self.mutate_line(note_id, line_id, "checklist_update", |line| {
            match line.content.as_mut().map(|content| &mut content.body) {
                Some(ContentBody::Checklist { items, .. }) => {
                    replace_at_path(items, path, updated_item)
                }
                _ => false,
            }
        })
    }

    /// Sets the checked flag of the item addressed by `path`.
    pub fn toggle_checklist_item(
        &mut self,
        note_id: &str,
        line_id: &str,
        path: &ChecklistPath,
        checked: bool,
    ) -> StoreResult<bool> {
        match self.checklist_item(note_id, line_id, path).cloned() {
            Some(item) if item.checked != checked => self.update_checklist_item(
                note_id,
                line_id,
                path,
                ChecklistItem { checked, ..item },
            ),
            _ => Ok(false),
        }
    }

    /// Applies one structural edit to the line's table content.
    pub fn update_table(&mut self, note_id: &str, line_id: &str, edit: TableEdit) -> StoreResult<bool> {
        self.mutate_line(note_id, line_id, "table_update", |line| {
            match line.content.as_mut().map(|content| &mut content.body) {
                Some(ContentBody::Table { data, .. }) => data.apply(edit),
                _ => false,
            }
        })
    }

    /// Replaces the whole collection (bulk import) and persists it.
    ///
    /// Selections pointing at ids that no longer exist are cleared.
    pub fn replace_notebooks(&mut self, notebooks: Vec<Notebook>) -> StoreResult<()> {
        self.notebooks = notebooks;
        if self.current_notebook().is_none() {
            self.current_notebook_id = self.notebooks.first().map(|notebook| notebook.id.clone());
        }
        if self.current_note().is_none() {
            self.current_note_id = None;
        }
        self.persist()?;
        info!(
            "event=notebooks_replace module=store status=ok notebook_count={}",
            self.notebooks.len()
        );
        self.notify("Notebooks imported!");
        Ok(())
    }

    /// Runs `apply` on the note; persists and refreshes `updated_at` only when
    /// the note exists and `apply` reports a change.
    ///
    /// `apply` must leave the note untouched when it returns `false`.
    fn mutate_note(
        &mut self,
        note_id: &str,
        event: &'static str,
        apply: impl FnOnce(&mut Note) -> bool,
    ) -> StoreResult<bool> {
        let Some(note) = self
            .notebooks
            .iter_mut()
            .flat_map(|notebook| notebook.notes.iter_mut())
            .find(|note| note.id == note_id)
        else {
            debug!("event={event} module=store status=skipped reason=note_not_found");
            return Ok(false);
        };

        if !apply(note) {
            debug!("event={event} module=store status=skipped reason=no_change");
            return Ok(false);
        }
        note.touch();
        self.persist()?;
        info!("event={event} module=store status=ok note_id={note_id}");
        Ok(true)
    }

    fn mutate_line(
        &mut self,
        note_id: &str,
        line_id: &str,
        event: &'static str,
        apply: impl FnOnce(&mut Line) -> bool,
    ) -> StoreResult<bool> {
        self.mutate_note(note_id, event, |note| {
            match note.lines.iter_mut().find(|line| line.id == line_id) {
                Some(line) => apply(line),
                None => false,
            }
        })
    }

    fn persist(&mut self) -> StoreResult<()> {
        save_notebooks(&mut self.storage, &self.notebooks)?;
        Ok(())
    }

    fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("event=notify module=store message={message}");
        self.notifications.push(Notification { message });
    }
}
