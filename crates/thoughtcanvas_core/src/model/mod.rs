//! Notebook domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by the store and persistence.
//! - Keep the persisted JSON shape (camelCase, flat content records) in one place.
//!
//! # Invariants
//! - Notebooks own notes, notes own lines, lines own at most one content item.
//! - Content kinds form a closed set; consumers match on them exhaustively.

pub mod checklist;
pub mod content;
pub mod notebook;
pub mod table;
