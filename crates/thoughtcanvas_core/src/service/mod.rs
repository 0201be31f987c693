//! Core use-case services.
//!
//! # Responsibility
//! - Own notebook state and funnel every mutation through named operations.
//! - Validate form and JSON input before it reaches the store.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod content_forms;
pub mod json_io;
pub mod store;
