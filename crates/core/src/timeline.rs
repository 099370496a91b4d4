//! Read model for rendering the history as a strip of thumbnails.

use serde::Serialize;

use crate::history::VersionHistory;
use crate::types::VersionId;

/// Short label shown under the root thumbnail.
pub const ROOT_SHORT_LABEL: &str = "ORIGIN";

/// One entry per version, in history order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub index: usize,
    pub version_id: VersionId,
    /// Full instruction label.
    pub label: String,
    /// `ORIGIN` for the root, `V.<index>` otherwise.
    pub short_label: String,
    /// Data URI of the first preview, if the version has any image.
    pub thumbnail: Option<String>,
    pub image_count: usize,
    pub is_current: bool,
    /// Past the current pointer; discarded by the next edit.
    pub is_future: bool,
}

/// Build the timeline for `history`.
pub fn build_timeline(history: &VersionHistory) -> Vec<TimelineEntry> {
    let current = history.current_index();
    history
        .versions()
        .iter()
        .enumerate()
        .map(|(index, version)| TimelineEntry {
            index,
            version_id: version.id(),
            label: version.label().to_string(),
            short_label: short_label(index),
            thumbnail: version
                .images()
                .first()
                .map(|image| image.preview.to_data_uri().into_owned()),
            image_count: version.image_count(),
            is_current: current == Some(index),
            is_future: current.is_some_and(|c| index > c),
        })
        .collect()
}

fn short_label(index: usize) -> String {
    if index == 0 {
        ROOT_SHORT_LABEL.to_string()
    } else {
        format!("V.{index}")
    }
}
