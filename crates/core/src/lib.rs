//! Domain types and the synchronous edit-history state machine for PixCI.
//!
//! This crate has no I/O. The async orchestration around it (codec and
//! AI-edit round trips, event fan-out) lives in `pixci-editor`.

pub mod conversation;
pub mod error;
pub mod error_body;
pub mod history;
pub mod preview;
pub mod timeline;
pub mod types;
pub mod validation;
