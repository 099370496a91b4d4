//! Notifications emitted by the coordinator.
//!
//! UI shells subscribe via
//! [`EditorCoordinator::subscribe`](crate::coordinator::EditorCoordinator::subscribe)
//! and re-read the coordinator's state when an event arrives. Events are
//! sent after the state change they describe has been applied.

use pixci_core::types::VersionId;
use serde::Serialize;

/// A state change of one editing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorEvent {
    /// A new root version replaced the history.
    Initialized {
        version_id: VersionId,
        image_count: usize,
    },

    /// Reference images were attached to the current version.
    ReferencesAppended {
        version_id: VersionId,
        added: usize,
        image_count: usize,
    },

    /// An image was detached from the current version.
    ReferenceRemoved {
        version_id: VersionId,
        index: usize,
        image_count: usize,
    },

    /// An edit round trip began.
    EditStarted {
        base_index: usize,
        instruction: String,
    },

    /// An edit produced a new current version.
    EditCompleted {
        version_id: VersionId,
        index: usize,
        instruction: String,
    },

    /// An edit failed; the history is unchanged.
    EditFailed {
        instruction: String,
        /// Human-readable description of the failure.
        message: String,
    },

    /// An edit finished after a reset and its result was dropped.
    EditDiscarded { instruction: String },

    /// The current pointer moved to an earlier or later version.
    RolledBack {
        index: usize,
        version_id: VersionId,
        label: String,
    },

    /// The history was cleared.
    Reset,
}
