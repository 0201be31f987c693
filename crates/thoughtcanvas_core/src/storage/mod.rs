//! Local storage and notebook persistence.
//!
//! # Responsibility
//! - Define the key/value local-storage contract and its backends.
//! - Serialize the whole notebook collection to one storage entry.

pub mod local_storage;
pub mod persistence;
