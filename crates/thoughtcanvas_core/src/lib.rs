//! Core domain logic for ThoughtCanvas+.
//! This crate owns notebooks, notes, lines and their rich content, and is the
//! single source of truth for how they change and persist.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod render;
pub mod service;
pub mod storage;

pub use config::resolve_db_path;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::checklist::{ChecklistItem, ChecklistPath};
pub use model::content::{ContentBody, ContentItem, ContentKind, UnknownContentKind};
pub use model::notebook::{Line, LineId, Note, NoteId, Notebook, NotebookId, Timestamp};
pub use model::table::{TableData, TableEdit};
pub use render::drawing::{DrawingCanvas, DrawingError};
pub use render::{content_label, render_content, render_note, ViewMode};
pub use service::content_forms::ContentFormError;
pub use service::json_io::JsonImportError;
pub use service::store::{NotebookStore, Notification, StoreError, StoreResult};
pub use storage::local_storage::{
    LocalStorage, MemoryLocalStorage, SqliteLocalStorage, StorageError, StorageResult,
};
pub use storage::persistence::PersistenceError;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
