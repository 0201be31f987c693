//! Schema migrations for the local-storage database.
//!
//! # Invariants
//! - Steps are listed in ascending version order with no gaps.
//! - Each step commits together with its `PRAGMA user_version` bump.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(version, sql)` pairs, oldest first.
const STEPS: &[(u32, &str)] = &[(1, include_str!("0001_local_storage.sql"))];

/// Highest schema version this build understands.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |(version, _)| *version)
}

/// Brings `conn` up to `latest_version()`.
///
/// Databases written by a newer build are rejected untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::SchemaTooNew {
            found: from_version,
            supported: latest,
        });
    }

    for (version, sql) in STEPS.iter().filter(|(version, _)| *version > from_version) {
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
        info!("event=db_migrate module=db status=ok from_version={from_version} to_version={version}");
    }
    Ok(())
}
