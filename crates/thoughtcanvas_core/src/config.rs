//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Decide where the notebook database lives.
//!
//! # Invariants
//! - A blank `THOUGHTCANVAS_DB_PATH` counts as unset.

use std::path::PathBuf;

/// Environment variable overriding the database location.
pub const DB_PATH_ENV: &str = "THOUGHTCANVAS_DB_PATH";
/// File name used under the temp directory when no override is set.
pub const DB_FILE_NAME: &str = "thoughtcanvas.sqlite3";

/// Returns the database path from `THOUGHTCANVAS_DB_PATH`, falling back to
/// `<temp_dir>/thoughtcanvas.sqlite3`.
pub fn resolve_db_path() -> PathBuf {
    db_path_from(std::env::var(DB_PATH_ENV).ok())
}

fn db_path_from(override_path: Option<String>) -> PathBuf {
    override_path
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME))
}
