//! Relay request and upstream payload types
//!
//! Inbound bodies are parsed into a `serde_json::Value` first and then
//! validated field by field, so each failure maps to its own error kind
//! (missing fields vs. malformed messages) instead of one generic serde error.

use crate::error::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    fn parse(role: &str) -> Option<Self> {
        match role {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: MessageRole,
    content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Validate one raw JSON message
    ///
    /// The role must be one of the three known roles and the content must be
    /// a JSON string (an empty string is allowed).
    fn from_value(value: &Value) -> RelayResult<Self> {
        let role = value
            .get("role")
            .and_then(Value::as_str)
            .and_then(MessageRole::parse)
            .ok_or(RelayError::InvalidMessage)?;
        let content = value
            .get("content")
            .and_then(Value::as_str)
            .ok_or(RelayError::InvalidMessage)?;

        Ok(Self::new(role, content))
    }
}

/// A validated inbound relay request
///
/// Exists for one request/response cycle only.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    messages: Vec<ChatMessage>,
    model_name: String,
    stream: bool,
    referer: Option<String>,
    title: Option<String>,
}

impl RelayRequest {
    /// Parse and validate a raw request body
    ///
    /// Checks run in order and stop at the first failure:
    /// 1. body is JSON
    /// 2. `messages` is a non-empty array and `modelName` a non-empty string
    /// 3. every message is well formed (one bad message rejects the request)
    pub fn from_slice(body: &[u8]) -> RelayResult<Self> {
        let value: Value = serde_json::from_slice(body).map_err(|_| RelayError::InvalidJson)?;
        Self::from_value(&value)
    }

    /// Validate an already parsed JSON body
    pub fn from_value(value: &Value) -> RelayResult<Self> {
        let raw_messages = value
            .get("messages")
            .and_then(Value::as_array)
            .filter(|messages| !messages.is_empty())
            .ok_or(RelayError::MissingFields)?;
        let model_name = value
            .get("modelName")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or(RelayError::MissingFields)?;

        let messages = raw_messages
            .iter()
            .map(ChatMessage::from_value)
            .collect::<RelayResult<Vec<_>>>()?;

        // Only a literal `true` switches to streaming.
        let stream = value.get("stream").and_then(Value::as_bool).unwrap_or(false);

        Ok(Self {
            messages,
            model_name: model_name.to_string(),
            stream,
            referer: non_empty_string(value.get("referer")),
            title: non_empty_string(value.get("title")),
        })
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn stream(&self) -> bool {
        self.stream
    }

    /// Client-supplied referer override, if any
    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    /// Client-supplied title override, if any
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Build the body sent upstream
    pub fn to_payload(&self) -> UpstreamPayload<'_> {
        UpstreamPayload {
            messages: &self.messages,
            model: &self.model_name,
            stream: self.stream,
        }
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Upstream request body, borrowed from the `RelayRequest` it came from
#[derive(Debug, Serialize)]
pub struct UpstreamPayload<'a> {
    pub messages: &'a [ChatMessage],
    pub model: &'a str,
    pub stream: bool,
}

/// Truncate `text` to at most `max_chars` characters for log output
///
/// Cuts on character boundaries, never inside a multi-byte sequence, and
/// appends `...` when something was dropped.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
