//! Edit-history coordinator.
//!
//! [`EditorCoordinator`] wraps a [`VersionHistory`] behind a mutex and
//! drives the service round trips around it:
//!
//! - uploads are encoded and decoded before they become the root version
//!   or extra references;
//! - an instruction is sent to the AI edit gateway, every edited code is
//!   decoded, and the result is committed as a new version.
//!
//! At most one edit is in flight at a time. A second
//! [`submit_instruction`](EditorCoordinator::submit_instruction) is
//! rejected with [`EditorError::ConcurrentEdit`]. Re-initialising or
//! resetting the history while an edit is in flight makes the late result
//! stale; it is dropped and reported as [`EditorError::Discarded`].
//!
//! The mutex is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{join_all, try_join_all};
use serde::Serialize;
use tokio::sync::broadcast;

use pixci_codec::api::{CodecApi, CodecApiError};
use pixci_codec::messages::{DecodeRequest, DecodeResponse, EncodeInput, EncodeOptions};
use pixci_codec::service::ArtifactCodec;
use pixci_core::conversation::TokenUsage;
use pixci_core::error::CoreError;
use pixci_core::history::{ArtifactImage, EditPlan, EditResult, Version, VersionHistory};
use pixci_core::preview::Preview;
use pixci_core::timeline::{build_timeline, TimelineEntry};
use pixci_core::types::VersionId;
use pixci_core::validation::{validate_instruction, DEFAULT_SCALE};
use pixci_gateway::api::GatewayApi;
use pixci_gateway::messages::EditRequest;
use pixci_gateway::service::EditGateway;

use crate::config::{ConfigError, EditorConfig};
use crate::error::{EditorError, ServiceError};
use crate::events::EditorEvent;

/// Broadcast channel capacity for editor events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Read-side types
// ---------------------------------------------------------------------------

/// A raw image file supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Coarse lifecycle state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorState {
    /// No version loaded.
    Empty,
    /// A version is current and no edit is running.
    Idle,
    /// An edit round trip is in flight.
    Editing,
}

/// Consistent copy of the coordinator's observable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorSnapshot {
    pub versions: Vec<Version>,
    pub current_index: Option<usize>,
    pub is_processing: bool,
}

// ---------------------------------------------------------------------------
// EditorCoordinator
// ---------------------------------------------------------------------------

/// The version a suspended operation must still find current.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    generation: u64,
    version_id: VersionId,
}

struct Inner {
    history: VersionHistory,
    /// Ticket of the edit currently in flight.
    in_flight: Option<u64>,
    next_ticket: u64,
}

/// Owns the version history of one editing session.
///
/// Shared by reference or `Arc`; every method takes `&self`.
pub struct EditorCoordinator {
    codec: Arc<dyn ArtifactCodec>,
    gateway: Arc<dyn EditGateway>,
    decode_scale: u32,
    encode_options: EncodeOptions,
    inner: Mutex<Inner>,
    event_tx: broadcast::Sender<EditorEvent>,
}

impl EditorCoordinator {
    pub fn new(codec: Arc<dyn ArtifactCodec>, gateway: Arc<dyn EditGateway>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            codec,
            gateway,
            decode_scale: DEFAULT_SCALE,
            encode_options: EncodeOptions::default(),
            inner: Mutex::new(Inner {
                history: VersionHistory::new(),
                in_flight: None,
                next_ticket: 1,
            }),
            event_tx,
        }
    }

    /// Build a coordinator talking to the services named in `config`.
    ///
    /// Both clients share one [`reqwest::Client`] carrying the configured
    /// timeout.
    pub fn from_config(config: &EditorConfig) -> Result<Self, ConfigError> {
        let client = config.http_client()?;
        let codec = CodecApi::with_client(client.clone(), config.api_url.as_str());
        let gateway = GatewayApi::with_client(client, config.ai_edit_url.as_str());

        tracing::info!(
            api_url = %codec.api_url(),
            ai_edit_url = %gateway.api_url(),
            timeout_secs = config.request_timeout_secs,
            "Editor coordinator configured",
        );

        Ok(Self::new(Arc::new(codec), Arc::new(gateway))
            .with_decode_scale(config.decode_scale)
            .with_encode_options(config.encode))
    }

    /// Scale used when rendering previews.
    pub fn with_decode_scale(mut self, scale: u32) -> Self {
        self.decode_scale = scale;
        self
    }

    /// Encoder hints applied to every upload.
    pub fn with_encode_options(mut self, options: EncodeOptions) -> Self {
        self.encode_options = options;
        self
    }

    /// Subscribe to state-change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.event_tx.subscribe()
    }

    // -- history mutation ---------------------------------------------------

    /// Replace the history with a root version built from `codes`.
    ///
    /// Allowed while an edit is in flight; that edit's result is discarded.
    pub fn initialize(
        &self,
        codes: Vec<String>,
        previews: Vec<Preview>,
    ) -> Result<VersionId, EditorError> {
        let (version_id, image_count) = {
            let mut inner = self.lock();
            let root = inner.history.initialize(codes, previews)?;
            let ids = (root.id(), root.image_count());
            inner.in_flight = None;
            ids
        };

        tracing::info!(version_id, image_count, "History initialized");
        self.publish(EditorEvent::Initialized {
            version_id,
            image_count,
        });
        Ok(version_id)
    }

    /// Attach reference images to the current version. They are sent with
    /// the next edit.
    pub fn append_reference_images(
        &self,
        codes: Vec<String>,
        previews: Vec<Preview>,
    ) -> Result<(), EditorError> {
        self.append_to(None, codes, previews)
    }

    /// Remove the image at `index` from the current version.
    pub fn remove_reference_image(&self, index: usize) -> Result<ArtifactImage, EditorError> {
        let (removed, version_id, image_count) = {
            let mut inner = self.lock();
            if inner.in_flight.is_some() {
                return Err(EditorError::ConcurrentEdit);
            }
            let removed = inner.history.remove_reference(index)?;
            let current = inner.history.current().ok_or(CoreError::NoCurrentVersion)?;
            (removed, current.id(), current.image_count())
        };

        tracing::info!(version_id, index, image_count, "Reference image removed");
        self.publish(EditorEvent::ReferenceRemoved {
            version_id,
            index,
            image_count,
        });
        Ok(removed)
    }

    /// Move the current pointer to `index` without touching any version.
    pub fn rollback_to(&self, index: usize) -> Result<(), EditorError> {
        let (version_id, label) = {
            let mut inner = self.lock();
            if inner.in_flight.is_some() {
                return Err(EditorError::ConcurrentEdit);
            }
            let version = inner.history.rollback_to(index)?;
            (version.id(), version.label().to_string())
        };

        tracing::info!(index, version_id, label = %label, "Rolled back");
        self.publish(EditorEvent::RolledBack {
            index,
            version_id,
            label,
        });
        Ok(())
    }

    /// Drop every version. An edit in flight is discarded when it returns.
    pub fn reset_all(&self) {
        let abandoned = {
            let mut inner = self.lock();
            inner.history.reset();
            inner.in_flight.take()
        };

        tracing::info!(abandoned_edit = abandoned.is_some(), "History reset");
        self.publish(EditorEvent::Reset);
    }

    // -- edits ----------------------------------------------------------------

    /// Send `instruction` to the AI edit gateway and commit the result as a
    /// new current version.
    ///
    /// Versions after the current one are discarded on success. On any
    /// failure the history is unchanged.
    pub async fn submit_instruction(&self, instruction: &str) -> Result<VersionId, EditorError> {
        validate_instruction(instruction)?;
        let instruction = instruction.trim().to_string();

        let (plan, guard) = {
            let mut inner = self.lock();
            let plan = inner.history.plan_edit()?;
            if inner.in_flight.is_some() {
                return Err(EditorError::ConcurrentEdit);
            }
            let ticket = inner.next_ticket;
            inner.next_ticket += 1;
            inner.in_flight = Some(ticket);
            (
                plan,
                ProcessingGuard {
                    inner: &self.inner,
                    ticket,
                },
            )
        };

        tracing::info!(
            base_index = plan.base_index,
            first_edit = plan.is_first_edit(),
            reference_count = plan.reference_codes.len(),
            instruction = %instruction,
            "Edit started",
        );
        self.publish(EditorEvent::EditStarted {
            base_index: plan.base_index,
            instruction: instruction.clone(),
        });

        let outcome = match self.run_edit(&plan, &instruction).await {
            Ok(result) => self.commit(&plan, result),
            Err(err) => Err(err),
        };
        drop(guard);

        match &outcome {
            Ok((version_id, index)) => {
                tracing::info!(version_id, index, "Edit completed");
                self.publish(EditorEvent::EditCompleted {
                    version_id: *version_id,
                    index: *index,
                    instruction,
                });
            }
            Err(EditorError::Discarded) => {
                tracing::info!(instruction = %instruction, "Edit result discarded");
                self.publish(EditorEvent::EditDiscarded { instruction });
            }
            Err(err) => {
                tracing::warn!(instruction = %instruction, error = %err, "Edit failed");
                self.publish(EditorEvent::EditFailed {
                    instruction,
                    message: err.to_string(),
                });
            }
        }

        outcome.map(|(version_id, _)| version_id)
    }

    // -- imports --------------------------------------------------------------

    /// Encode and render `uploads`, then make them the root version.
    ///
    /// Nothing is committed unless every upload converts.
    pub async fn import_images(&self, uploads: Vec<ImageUpload>) -> Result<VersionId, EditorError> {
        let (codes, previews) = self.convert_uploads(uploads).await?;
        self.initialize(codes, previews)
    }

    /// Encode and render `uploads`, then attach them to the current version.
    ///
    /// Nothing is committed unless every upload converts. The images go to
    /// the version that was current when the import started; if the
    /// history was reset, replaced or rolled back in the meantime, the
    /// import is [`Discarded`](EditorError::Discarded).
    pub async fn import_reference_images(
        &self,
        uploads: Vec<ImageUpload>,
    ) -> Result<(), EditorError> {
        let anchor = {
            let inner = self.lock();
            if inner.in_flight.is_some() {
                return Err(EditorError::ConcurrentEdit);
            }
            let current = inner.history.current().ok_or(CoreError::NoCurrentVersion)?;
            Anchor {
                generation: inner.history.generation(),
                version_id: current.id(),
            }
        };

        let (codes, previews) = self.convert_uploads(uploads).await?;
        self.append_to(Some(anchor), codes, previews)
    }

    // -- read side ------------------------------------------------------------

    pub fn snapshot(&self) -> EditorSnapshot {
        let inner = self.lock();
        EditorSnapshot {
            versions: inner.history.versions().to_vec(),
            current_index: inner.history.current_index(),
            is_processing: inner.in_flight.is_some(),
        }
    }

    pub fn current_version(&self) -> Option<Version> {
        self.lock().history.current().cloned()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.lock().history.current_index()
    }

    pub fn version_count(&self) -> usize {
        self.lock().history.len()
    }

    /// `true` exactly while an edit round trip is in flight.
    pub fn is_processing(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    pub fn state(&self) -> EditorState {
        let inner = self.lock();
        match (inner.history.current_index(), inner.in_flight) {
            (None, _) => EditorState::Empty,
            (Some(_), None) => EditorState::Idle,
            (Some(_), Some(_)) => EditorState::Editing,
        }
    }

    pub fn timeline(&self) -> Vec<TimelineEntry> {
        build_timeline(&self.lock().history)
    }

    /// Token usage of the edits on the root-to-current path.
    pub fn total_usage(&self) -> TokenUsage {
        self.lock().history.active_usage()
    }

    // ---- private helpers ----

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: EditorEvent) {
        // A send error only means nobody is subscribed.
        let _ = self.event_tx.send(event);
    }

    /// Append to the current version, provided it is still the one
    /// `anchor` recorded.
    fn append_to(
        &self,
        anchor: Option<Anchor>,
        codes: Vec<String>,
        previews: Vec<Preview>,
    ) -> Result<(), EditorError> {
        let added = codes.len();
        let (version_id, image_count) = {
            let mut inner = self.lock();
            if inner.in_flight.is_some() {
                return Err(EditorError::ConcurrentEdit);
            }
            if let Some(anchor) = anchor {
                let current_id = inner.history.current().map(Version::id);
                if inner.history.generation() != anchor.generation
                    || current_id != Some(anchor.version_id)
                {
                    tracing::info!(
                        version_id = anchor.version_id,
                        current_id = ?current_id,
                        "Reference import discarded",
                    );
                    return Err(EditorError::Discarded);
                }
            }
            let version = inner.history.append_references(codes, previews)?;
            (version.id(), version.image_count())
        };

        tracing::info!(version_id, added, image_count, "Reference images appended");
        self.publish(EditorEvent::ReferencesAppended {
            version_id,
            added,
            image_count,
        });
        Ok(())
    }

    async fn run_edit(&self, plan: &EditPlan, instruction: &str) -> Result<EditResult, EditorError> {
        let request = EditRequest {
            reference_codes: plan.reference_codes.clone(),
            instruction: instruction.to_string(),
            conversation: plan.conversation.clone(),
        };

        let response = self.gateway.edit(&request).await?;
        if response.edited_codes.is_empty() {
            return Err(ServiceError::EmptyEdit.into());
        }
        if plan.is_first_edit() && response.edited_codes.len() != plan.reference_codes.len() {
            return Err(ServiceError::EditCountMismatch {
                submitted: plan.reference_codes.len(),
                edited: response.edited_codes.len(),
            }
            .into());
        }

        let previews = self.decode_edited(&response.edited_codes).await?;

        Ok(EditResult {
            label: instruction.to_string(),
            codes: response.edited_codes,
            previews,
            conversation: response.conversation,
            usage: response.usage,
        })
    }

    /// Decode every edited code. A batch where only some codes decode is a
    /// [`EditorError::DecodeMismatch`].
    async fn decode_edited(&self, codes: &[String]) -> Result<Vec<Preview>, EditorError> {
        let results = join_all(codes.iter().map(|code| self.decode_one(code))).await;

        let edited = results.len();
        let mut previews = Vec::with_capacity(edited);
        let mut first_error = None;
        for result in results {
            match result {
                Ok(preview) => previews.push(preview),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            None => Ok(previews),
            Some(err) if previews.is_empty() => Err(err.into()),
            Some(err) => Err(EditorError::DecodeMismatch {
                edited,
                decoded: previews.len(),
                reason: err.to_string(),
            }),
        }
    }

    async fn decode_one(&self, code: &str) -> Result<Preview, CodecApiError> {
        let request = DecodeRequest {
            markup_code: code.to_string(),
            scale: self.decode_scale,
        };
        self.codec
            .decode(&request)
            .await
            .map(DecodeResponse::into_preview)
    }

    fn commit(&self, plan: &EditPlan, result: EditResult) -> Result<(VersionId, usize), EditorError> {
        let mut inner = self.lock();
        match inner.history.commit_edit(plan, result) {
            Ok(version) => {
                let version_id = version.id();
                let index = inner.history.len() - 1;
                Ok((version_id, index))
            }
            Err(CoreError::StaleGeneration { expected, actual }) => {
                tracing::debug!(expected, actual, "History changed during edit");
                Err(EditorError::Discarded)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn convert_uploads(
        &self,
        uploads: Vec<ImageUpload>,
    ) -> Result<(Vec<String>, Vec<Preview>), EditorError> {
        if uploads.is_empty() {
            return Err(CoreError::Validation("At least one image is required".to_string()).into());
        }

        let inputs: Vec<EncodeInput> = uploads
            .into_iter()
            .map(|upload| EncodeInput {
                file_name: upload.file_name,
                bytes: upload.bytes,
                options: self.encode_options,
            })
            .collect();

        let encoded = try_join_all(inputs.iter().map(|input| self.codec.encode(input))).await?;
        let codes: Vec<String> = encoded
            .into_iter()
            .map(|response| response.markup_code)
            .collect();
        let previews = try_join_all(codes.iter().map(|code| self.decode_one(code))).await?;

        tracing::info!(count = codes.len(), "Uploads converted");
        Ok((codes, previews))
    }
}

// ---------------------------------------------------------------------------
// ProcessingGuard
// ---------------------------------------------------------------------------

/// Clears the in-flight marker when an edit settles, unless the history
/// was reset or re-initialised in the meantime.
struct ProcessingGuard<'a> {
    inner: &'a Mutex<Inner>,
    ticket: u64,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.in_flight == Some(self.ticket) {
            inner.in_flight = None;
        }
    }
}
