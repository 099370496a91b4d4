//! Linear edit history with rollback and truncate-on-edit.
//!
//! [`VersionHistory`] owns an ordered list of [`Version`]s and a pointer to
//! the current one. Rolling back only moves the pointer; the next committed
//! edit discards everything after the version it was based on, so the
//! history is always a single path.
//!
//! Edits are two-phase. [`VersionHistory::plan_edit`] captures what must be
//! sent to the gateway together with the history's generation, and
//! [`VersionHistory::commit_edit`] applies the result only if the
//! generation is unchanged. A reset or re-initialisation between the two
//! phases therefore turns the late result into a
//! [`CoreError::StaleGeneration`] instead of corrupting the new history.

use chrono::Utc;
use serde::Serialize;

use crate::conversation::{ConversationContext, TokenUsage};
use crate::error::CoreError;
use crate::preview::Preview;
use crate::types::{ReferenceId, Timestamp, VersionId};

/// Label given to the root version created from uploaded images.
pub const ROOT_LABEL: &str = "Original";

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// One artifact code with its rendered preview.
///
/// Pairing the two in one record keeps codes and previews the same length
/// for every version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactImage {
    pub code: String,
    pub preview: Preview,
    /// Set while the code has not been sent through an edit call yet.
    pub pending: Option<ReferenceId>,
}

/// A snapshot in the edit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Version {
    id: VersionId,
    label: String,
    images: Vec<ArtifactImage>,
    conversation: ConversationContext,
    usage: Option<TokenUsage>,
    created_at: Timestamp,
}

impl Version {
    pub fn id(&self) -> VersionId {
        self.id
    }

    /// The instruction that produced this version, or [`ROOT_LABEL`].
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn images(&self) -> &[ArtifactImage] {
        &self.images
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Markup codes in display order.
    pub fn artifact_codes(&self) -> Vec<&str> {
        self.images.iter().map(|image| image.code.as_str()).collect()
    }

    /// Previews in the same order as [`artifact_codes`](Self::artifact_codes).
    pub fn previews(&self) -> Vec<&Preview> {
        self.images.iter().map(|image| &image.preview).collect()
    }

    /// Codes attached since the last edit call, in display order.
    pub fn pending_codes(&self) -> Vec<&str> {
        self.images
            .iter()
            .filter(|image| image.pending.is_some())
            .map(|image| image.code.as_str())
            .collect()
    }

    /// Pending reference ids paired with their codes.
    pub fn pending_references(&self) -> Vec<(ReferenceId, &str)> {
        self.images
            .iter()
            .filter_map(|image| image.pending.map(|id| (id, image.code.as_str())))
            .collect()
    }

    pub fn conversation(&self) -> &ConversationContext {
        &self.conversation
    }

    pub fn usage(&self) -> Option<TokenUsage> {
        self.usage
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

// ---------------------------------------------------------------------------
// Edit plan / result
// ---------------------------------------------------------------------------

/// What an edit call must send, captured before the call starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPlan {
    /// Index of the version the edit is based on.
    pub base_index: usize,
    /// History generation when the plan was made.
    pub generation: u64,
    /// Full codes for the first edit from the root, pending codes otherwise.
    pub reference_codes: Vec<String>,
    /// `None` starts a new conversation.
    pub conversation: Option<ConversationContext>,
}

impl EditPlan {
    /// `true` when the edit starts a new gateway conversation.
    pub fn is_first_edit(&self) -> bool {
        self.conversation.is_none()
    }
}

/// Everything needed to append a version after a successful edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    pub label: String,
    pub codes: Vec<String>,
    pub previews: Vec<Preview>,
    pub conversation: ConversationContext,
    pub usage: Option<TokenUsage>,
}

// ---------------------------------------------------------------------------
// VersionHistory
// ---------------------------------------------------------------------------

/// Ordered versions plus the current pointer.
#[derive(Debug)]
pub struct VersionHistory {
    versions: Vec<Version>,
    current: Option<usize>,
    generation: u64,
    next_version_id: VersionId,
    next_reference_id: ReferenceId,
}

impl Default for VersionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionHistory {
    pub fn new() -> Self {
        Self {
            versions: Vec::new(),
            current: None,
            generation: 0,
            next_version_id: 1,
            next_reference_id: 1,
        }
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Index of the current version, `None` before the first upload.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Version> {
        self.current.map(|index| &self.versions[index])
    }

    /// Counter bumped whenever versions are replaced or appended.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the whole history with a root version holding `codes`.
    ///
    /// Every code starts as a pending reference and the root carries an
    /// empty conversation.
    pub fn initialize(
        &mut self,
        codes: Vec<String>,
        previews: Vec<Preview>,
    ) -> Result<&Version, CoreError> {
        if codes.is_empty() {
            return Err(CoreError::Validation(
                "At least one image is required".to_string(),
            ));
        }
        check_lengths(&codes, &previews)?;

        let images = self.attach_pending(codes, previews);
        let root = Version {
            id: self.allocate_version_id(),
            label: ROOT_LABEL.to_string(),
            images,
            conversation: ConversationContext::new(),
            usage: None,
            created_at: Utc::now(),
        };

        self.versions = vec![root];
        self.current = Some(0);
        self.generation += 1;
        Ok(&self.versions[0])
    }

    /// Attach extra reference images to the current version.
    pub fn append_references(
        &mut self,
        codes: Vec<String>,
        previews: Vec<Preview>,
    ) -> Result<&Version, CoreError> {
        let index = self.current.ok_or(CoreError::NoCurrentVersion)?;
        if codes.is_empty() {
            return Err(CoreError::Validation(
                "At least one reference image is required".to_string(),
            ));
        }
        check_lengths(&codes, &previews)?;

        let images = self.attach_pending(codes, previews);
        self.versions[index].images.extend(images);
        Ok(&self.versions[index])
    }

    /// Remove the image at `index` from the current version.
    ///
    /// Removal is positional, so duplicate codes are unambiguous.
    pub fn remove_reference(&mut self, index: usize) -> Result<ArtifactImage, CoreError> {
        let current = self.current.ok_or(CoreError::NoCurrentVersion)?;
        let images = &mut self.versions[current].images;
        if index >= images.len() {
            return Err(CoreError::OutOfRange {
                index,
                len: images.len(),
            });
        }
        Ok(images.remove(index))
    }

    /// Capture the gateway request for an edit of the current version.
    ///
    /// From the root the full code list is sent without a conversation;
    /// from any later version only pending codes are sent, together with
    /// that version's conversation.
    pub fn plan_edit(&self) -> Result<EditPlan, CoreError> {
        let base_index = self.current.ok_or(CoreError::NoCurrentVersion)?;
        let base = &self.versions[base_index];

        if base_index == 0 {
            if base.images.is_empty() {
                return Err(CoreError::Validation(
                    "The original version has no images to edit".to_string(),
                ));
            }
            return Ok(EditPlan {
                base_index,
                generation: self.generation,
                reference_codes: base.images.iter().map(|i| i.code.clone()).collect(),
                conversation: None,
            });
        }

        Ok(EditPlan {
            base_index,
            generation: self.generation,
            reference_codes: base
                .pending_codes()
                .into_iter()
                .map(str::to_string)
                .collect(),
            conversation: Some(base.conversation.clone()),
        })
    }

    /// Append the result of a planned edit, discarding any versions after
    /// the plan's base.
    pub fn commit_edit(
        &mut self,
        plan: &EditPlan,
        result: EditResult,
    ) -> Result<&Version, CoreError> {
        if plan.generation != self.generation {
            return Err(CoreError::StaleGeneration {
                expected: plan.generation,
                actual: self.generation,
            });
        }
        if plan.base_index >= self.versions.len() {
            return Err(CoreError::OutOfRange {
                index: plan.base_index,
                len: self.versions.len(),
            });
        }
        if result.codes.is_empty() {
            return Err(CoreError::Validation(
                "Edit produced no artifact codes".to_string(),
            ));
        }
        check_lengths(&result.codes, &result.previews)?;

        let images = result
            .codes
            .into_iter()
            .zip(result.previews)
            .map(|(code, preview)| ArtifactImage {
                code,
                preview,
                pending: None,
            })
            .collect();
        let version = Version {
            id: self.allocate_version_id(),
            label: result.label,
            images,
            conversation: result.conversation,
            usage: result.usage,
            created_at: Utc::now(),
        };

        self.versions.truncate(plan.base_index + 1);
        self.versions.push(version);
        let last = self.versions.len() - 1;
        self.current = Some(last);
        self.generation += 1;
        Ok(&self.versions[last])
    }

    /// Move the current pointer. No version is modified.
    pub fn rollback_to(&mut self, index: usize) -> Result<&Version, CoreError> {
        if index >= self.versions.len() {
            return Err(CoreError::OutOfRange {
                index,
                len: self.versions.len(),
            });
        }
        self.current = Some(index);
        Ok(&self.versions[index])
    }

    /// Drop every version. Ids keep counting so they are never reused.
    pub fn reset(&mut self) {
        self.versions.clear();
        self.current = None;
        self.generation += 1;
    }

    /// Token usage summed over the root-to-current path.
    pub fn active_usage(&self) -> TokenUsage {
        let Some(current) = self.current else {
            return TokenUsage::default();
        };
        self.versions[..=current]
            .iter()
            .filter_map(Version::usage)
            .fold(TokenUsage::default(), |acc, usage| acc + usage)
    }

    // ---- private helpers ----

    fn allocate_version_id(&mut self) -> VersionId {
        let id = self.next_version_id;
        self.next_version_id += 1;
        id
    }

    fn attach_pending(&mut self, codes: Vec<String>, previews: Vec<Preview>) -> Vec<ArtifactImage> {
        codes
            .into_iter()
            .zip(previews)
            .map(|(code, preview)| {
                let id = self.next_reference_id;
                self.next_reference_id += 1;
                ArtifactImage {
                    code,
                    preview,
                    pending: Some(id),
                }
            })
            .collect()
    }
}

fn check_lengths(codes: &[String], previews: &[Preview]) -> Result<(), CoreError> {
    if codes.len() == previews.len() {
        Ok(())
    } else {
        Err(CoreError::LengthMismatch {
            codes: codes.len(),
            previews: previews.len(),
        })
    }
}
