//! Conversation state returned by the AI edit gateway, plus token accounting.
//!
//! The coordinator never inspects the messages; it stores what the gateway
//! returns and replays it verbatim on the next edit call.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Author of a message built on this side of the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message record, kept exactly as the gateway produced it.
///
/// Roles outside [`Role`], structured content and extra fields all
/// survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationMessage(Value);

impl ConversationMessage {
    /// A `{"role", "content"}` record with text content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self(json!({"role": role.as_str(), "content": content.into()}))
    }

    /// The `role` field, if it is a string.
    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    /// The `content` field, if it is plain text.
    pub fn content(&self) -> Option<&str> {
        self.0.get("content").and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for ConversationMessage {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Ordered message records accumulated across edits.
///
/// Serializes as a plain JSON array so it can be handed back to the
/// gateway unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationContext(Vec<ConversationMessage>);

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ConversationMessage>> for ConversationContext {
    fn from(messages: Vec<ConversationMessage>) -> Self {
        Self(messages)
    }
}

/// Token accounting reported by the gateway for one edit call.
///
/// Missing fields deserialize as zero; some providers omit
/// `total_tokens`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl Add for TokenUsage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
