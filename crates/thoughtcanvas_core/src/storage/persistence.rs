//! Notebook collection persistence adapter.
//!
//! # Responsibility
//! - Load the notebook collection from local storage, seeding defaults on
//!   first run.
//! - Write the full collection back under a single key.
//!
//! # Invariants
//! - The stored document is a JSON array of notebooks under `notebooks`.
//! - Writes are whole-document; there is no partial write or migration.

use crate::model::notebook::{Line, Note, Notebook};
use crate::storage::local_storage::{LocalStorage, StorageError};
use chrono::Utc;
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Local-storage key holding the notebook collection.
pub const NOTEBOOKS_KEY: &str = "notebooks";

/// Persistence failure.
#[derive(Debug)]
pub enum PersistenceError {
    Storage(StorageError),
    /// Stored document could not be encoded or decoded.
    Serialization(serde_json::Error),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "notebook document is invalid: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Serialization(err) => Some(err),
        }
    }
}

impl From<StorageError> for PersistenceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Loads the stored collection, or writes and returns the default seed.
///
/// An empty stored value counts as missing.
pub fn load_notebooks<S: LocalStorage>(storage: &mut S) -> Result<Vec<Notebook>, PersistenceError> {
    match storage.get_item(NOTEBOOKS_KEY)? {
        Some(stored) if !stored.is_empty() => {
            let notebooks: Vec<Notebook> = serde_json::from_str(&stored).map_err(|err| {
                error!(
                    "event=notebooks_load module=persistence status=error error_code=decode_failed error={}",
                    err
                );
                err
            })?;
            info!(
                "event=notebooks_load module=persistence status=ok source=stored notebook_count={}",
                notebooks.len()
            );
            Ok(notebooks)
        }
        _ => {
            let seeded = default_notebooks();
            save_notebooks(storage, &seeded)?;
            info!(
                "event=notebooks_load module=persistence status=ok source=seeded notebook_count={}",
                seeded.len()
            );
            Ok(seeded)
        }
    }
}

/// Serializes the full collection under `NOTEBOOKS_KEY`.
pub fn save_notebooks<S: LocalStorage>(
    storage: &mut S,
    notebooks: &[Notebook],
) -> Result<(), PersistenceError> {
    let document = serde_json::to_string(notebooks)?;
    storage.set_item(NOTEBOOKS_KEY, &document)?;
    debug!(
        "event=notebooks_save module=persistence status=ok notebook_count={} bytes={}",
        notebooks.len(),
        document.len()
    );
    Ok(())
}

/// First-run dataset: "Personal" with one note and "Work" with none.
pub fn default_notebooks() -> Vec<Notebook> {
    let now = Utc::now();
    vec![
        Notebook {
            id: "notebook-1".to_string(),
            title: "Personal".to_string(),
            description: Some("My personal thoughts and ideas".to_string()),
            notes: vec![Note {
                id: "note-1".to_string(),
                title: "My First Note".to_string(),
                lines: vec![
                    seed_line("line-1", "This is my first note in ThoughtCanvas+"),
                    seed_line(
                        "line-2",
                        "I can add different types of content using the + button",
                    ),
                ],
                created_at: now,
                updated_at: now,
                linked_notes: Vec::new(),
            }],
            created_at: now,
        },
        Notebook {
            id: "notebook-2".to_string(),
            title: "Work".to_string(),
            description: Some("Project ideas and meeting notes".to_string()),
            notes: Vec::new(),
            created_at: now,
        },
    ]
}

fn seed_line(id: &str, text: &str) -> Line {
    Line {
        id: id.to_string(),
        text: text.to_string(),
        content: None,
        tags: Vec::new(),
    }
}
