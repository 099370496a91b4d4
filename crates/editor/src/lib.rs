//! Edit-history coordinator for PixCI.
//!
//! [`EditorCoordinator`](coordinator::EditorCoordinator) owns the version
//! history of one editing session and drives the encode, AI-edit and
//! decode round trips against the external services. UI shells hold a
//! shared reference, call its operations, and re-render on
//! [`EditorEvent`](events::EditorEvent)s.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
