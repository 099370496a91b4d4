//! Request and response bodies of the AI edit route (camelCase JSON).

use pixci_core::conversation::{ConversationContext, TokenUsage};
use serde::{Deserialize, Serialize};

/// Body of `POST /ai/edit`.
///
/// Without a conversation the call starts a new one and the first
/// reference code is the artifact being edited. With a conversation, the
/// reference codes are new material appended to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub reference_codes: Vec<String>,
    pub instruction: String,
    #[serde(
        rename = "conversationContext",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub conversation: Option<ConversationContext>,
}

/// Response of `POST /ai/edit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResponse {
    pub edited_codes: Vec<String>,
    #[serde(rename = "conversationContext", default)]
    pub conversation: ConversationContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}
