//! In-memory fakes of the conversion service and the AI edit gateway.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Semaphore;

use pixci_codec::api::CodecApiError;
use pixci_codec::messages::{DecodeRequest, DecodeResponse, EncodeInput, EncodeResponse};
use pixci_codec::service::ArtifactCodec;
use pixci_core::conversation::{ConversationMessage, Role, TokenUsage};
use pixci_core::preview::Preview;
use pixci_editor::coordinator::{EditorCoordinator, ImageUpload};
use pixci_gateway::api::GatewayApiError;
use pixci_gateway::messages::{EditRequest, EditResponse};
use pixci_gateway::service::EditGateway;

/// Usage reported by [`FakeGateway`] for every successful edit.
pub const EDIT_USAGE: TokenUsage = TokenUsage {
    prompt_tokens: 100,
    completion_tokens: 20,
    total_tokens: 120,
};

// ---------------------------------------------------------------------------
// FakeCodec
// ---------------------------------------------------------------------------

/// Encodes a file name into `<pxvg src="..."/>` and decodes a code into the
/// raw preview `png:<code>`.
///
/// File names containing `corrupt` fail to encode; codes containing `bad`
/// fail to decode.
#[derive(Default)]
pub struct FakeCodec {
    pub encode_calls: AtomicUsize,
    pub decode_calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl FakeCodec {
    /// A codec that holds every encode until a permit is added to `gate`.
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn encode_calls(&self) -> usize {
        self.encode_calls.load(Ordering::SeqCst)
    }

    pub fn decode_calls(&self) -> usize {
        self.decode_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactCodec for FakeCodec {
    async fn encode(&self, input: &EncodeInput) -> Result<EncodeResponse, CodecApiError> {
        self.encode_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if input.file_name.contains("corrupt") {
            return Err(CodecApiError::ApiError {
                status: 400,
                message: format!("Cannot read image '{}'", input.file_name),
            });
        }
        Ok(EncodeResponse {
            markup_code: format!("<pxvg src=\"{}\"/>", input.file_name),
            grid_width: 8,
            grid_height: 8,
            color_count: 4,
            block_size: input.options.block_size,
        })
    }

    async fn decode(&self, request: &DecodeRequest) -> Result<DecodeResponse, CodecApiError> {
        self.decode_calls.fetch_add(1, Ordering::SeqCst);
        if request.markup_code.contains("bad") {
            return Err(CodecApiError::ApiError {
                status: 400,
                message: "Invalid PXVG code".to_string(),
            });
        }
        Ok(DecodeResponse {
            image_base64: format!("png:{}", request.markup_code),
            width: 8,
            height: 8,
            scaled_width: 8 * request.scale,
            scaled_height: 8 * request.scale,
        })
    }
}

/// The preview [`FakeCodec`] renders for `code`.
pub fn preview_of(code: &str) -> Preview {
    Preview::Raw(format!("png:{code}"))
}

// ---------------------------------------------------------------------------
// FakeGateway
// ---------------------------------------------------------------------------

/// Records every request and answers by instruction keyword:
///
/// - `fail`: 500 error
/// - `empty`: no edited codes
/// - `mixed`: one code per reference code, the last one undecodable
/// - `broken`: a single undecodable code
/// - `merged`: a single code however many references were sent
/// - anything else: one edited code per reference code (at least one)
///
/// The returned conversation is the request's conversation plus one user
/// and one assistant message. With `annotated`, the assistant message uses
/// a role, content shape and extra field outside the usual chat format.
#[derive(Default)]
pub struct FakeGateway {
    requests: Mutex<Vec<EditRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeGateway {
    /// A gateway that holds every edit until a permit is added to `gate`.
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            gate: Some(gate),
        }
    }

    pub fn requests(&self) -> Vec<EditRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> EditRequest {
        self.requests().last().cloned().expect("no edit request recorded")
    }
}

#[async_trait]
impl EditGateway for FakeGateway {
    async fn edit(&self, request: &EditRequest) -> Result<EditResponse, GatewayApiError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let instruction = request.instruction.as_str();
        if instruction.contains("fail") {
            return Err(GatewayApiError::ApiError {
                status: 500,
                message: "Model unavailable".to_string(),
            });
        }

        let count = request.reference_codes.len().max(1);
        let edited_codes = if instruction.contains("empty") {
            Vec::new()
        } else if instruction.contains("mixed") {
            (0..count)
                .map(|i| {
                    if i + 1 == count {
                        "<pxvg bad/>".to_string()
                    } else {
                        format!("<pxvg edit=\"{call}.{i}\"/>")
                    }
                })
                .collect()
        } else if instruction.contains("broken") {
            vec!["<pxvg bad/>".to_string()]
        } else if instruction.contains("merged") {
            vec![format!("<pxvg edit=\"{call}\"/>")]
        } else {
            (0..count)
                .map(|i| format!("<pxvg edit=\"{call}.{i}\"/>"))
                .collect()
        };

        let mut messages = request
            .conversation
            .as_ref()
            .map(|c| c.messages().to_vec())
            .unwrap_or_default();
        messages.push(ConversationMessage::new(
            Role::User,
            request.instruction.clone(),
        ));
        if instruction.contains("annotated") {
            messages.push(annotated_reply(&edited_codes).into());
        } else {
            messages.push(ConversationMessage::new(
                Role::Assistant,
                edited_codes.join("\n"),
            ));
        }

        Ok(EditResponse {
            edited_codes,
            conversation: messages.into(),
            usage: Some(EDIT_USAGE),
        })
    }
}

/// The assistant message [`FakeGateway`] returns for `annotated` edits.
pub fn annotated_reply(edited_codes: &[String]) -> serde_json::Value {
    json!({
        "role": "model",
        "content": [{"type": "text", "text": edited_codes.join("\n")}],
        "name": "pixel-artist",
    })
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct Harness {
    pub codec: Arc<FakeCodec>,
    pub gateway: Arc<FakeGateway>,
    pub editor: Arc<EditorCoordinator>,
}

pub fn harness() -> Harness {
    build(FakeCodec::default(), FakeGateway::default())
}

/// A harness whose gateway blocks until a permit is added to the
/// returned semaphore.
pub fn gated_harness() -> (Harness, Arc<Semaphore>) {
    let gate = Arc::new(Semaphore::new(0));
    (build(FakeCodec::default(), FakeGateway::gated(gate.clone())), gate)
}

/// A harness whose codec blocks every encode until a permit is added to
/// the returned semaphore.
pub fn gated_codec_harness() -> (Harness, Arc<Semaphore>) {
    let gate = Arc::new(Semaphore::new(0));
    (build(FakeCodec::gated(gate.clone()), FakeGateway::default()), gate)
}

fn build(codec: FakeCodec, gateway: FakeGateway) -> Harness {
    let codec = Arc::new(codec);
    let gateway = Arc::new(gateway);
    let editor = Arc::new(EditorCoordinator::new(codec.clone(), gateway.clone()));
    Harness {
        codec,
        gateway,
        editor,
    }
}

pub fn code(name: &str) -> String {
    format!("<pxvg id=\"{name}\"/>")
}

/// Codes and matching previews for `names`.
pub fn images(names: &[&str]) -> (Vec<String>, Vec<Preview>) {
    let codes: Vec<String> = names.iter().map(|name| code(name)).collect();
    let previews = codes.iter().map(|c| preview_of(c)).collect();
    (codes, previews)
}

pub fn upload(file_name: &str) -> ImageUpload {
    ImageUpload::new(file_name, vec![0x89, b'P', b'N', b'G'])
}

/// Yield until `condition` holds, failing after a bounded number of tries.
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
