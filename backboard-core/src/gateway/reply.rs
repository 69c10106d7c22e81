//! Decoding of backend reply bodies
//!
//! The query endpoint has answered with several shapes over time:
//!
//! ```text
//! ["answer text", ["source 1", "source 2"]]      ordered pair
//! {"response": "...", "sources": [...]}          keyed object (or "content")
//! "answer text"  /  answer text                  JSON scalar or plain text
//! ```
//!
//! [`BackendReply`] captures whichever arrived and [`BackendReply::normalize`]
//! collapses it into a [`NormalizedReply`]. Nothing outside the gateway sees
//! the raw shapes.

use serde_json::{Map, Value};

use crate::types::ToolResult;

/// Shown instead of an empty assistant bubble
pub const EMPTY_REPLY_FALLBACK: &str =
    "I couldn't find an answer to that. Please try rephrasing your question or ask again.";

/// A reply body as it arrived on the wire
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BackendReply {
    Pair { text: Value, sources: Value },
    Object(Map<String, Value>),
    Scalar(Value),
}

/// Canonical reply: display text plus raw source strings in backend order
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NormalizedReply {
    pub text: String,
    pub sources: Vec<String>,
}

impl BackendReply {
    /// Decode a response body; bodies that are not JSON are plain text.
    pub fn decode(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => BackendReply::Scalar(Value::String(body.to_string())),
        }
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Array(mut items) if items.len() == 2 => {
                let sources = items.pop().unwrap_or(Value::Null);
                let text = items.pop().unwrap_or(Value::Null);
                BackendReply::Pair { text, sources }
            }
            Value::Object(map) => BackendReply::Object(map),
            other => BackendReply::Scalar(other),
        }
    }

    pub fn normalize(self) -> NormalizedReply {
        let (text, sources) = match self {
            BackendReply::Pair { text, sources } => (render_text(&text), source_strings(&sources)),
            BackendReply::Object(map) => {
                let text = ["response", "content"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str))
                    .map(str::to_string)
                    .unwrap_or_else(|| Value::Object(map.clone()).to_string());
                let sources = map.get("sources").map(source_strings).unwrap_or_default();
                (text, sources)
            }
            BackendReply::Scalar(value) => (render_text(&value), Vec::new()),
        };

        let text = if text.trim().is_empty() {
            tracing::debug!("Backend returned empty reply text, substituting fallback");
            EMPTY_REPLY_FALLBACK.to_string()
        } else {
            text
        };

        NormalizedReply { text, sources }
    }
}

fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn source_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(render_text)
            .collect(),
        _ => Vec::new(),
    }
}

/// A `/messages/send` body: free text or a structured tool result
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SendReply {
    Text(String),
    Tool(ToolResult),
}

impl SendReply {
    pub fn decode(body: &str) -> Self {
        let value = match serde_json::from_str::<Value>(body) {
            Ok(value) => value,
            Err(_) => return SendReply::Text(body.to_string()),
        };

        if value.get("type").and_then(Value::as_str) == Some("tool_result") {
            match serde_json::from_value::<ToolResult>(value.clone()) {
                Ok(tool) => return SendReply::Tool(tool),
                Err(e) => tracing::warn!("Malformed tool_result payload: {}", e),
            }
        }

        SendReply::Text(BackendReply::from_value(value).normalize().text)
    }

    /// Text for the assistant bubble
    pub fn display_text(&self) -> String {
        let text = match self {
            SendReply::Text(text) => text.clone(),
            SendReply::Tool(tool) => render_tool_result(tool),
        };
        if text.trim().is_empty() {
            EMPTY_REPLY_FALLBACK.to_string()
        } else {
            text
        }
    }
}

fn render_tool_result(tool: &ToolResult) -> String {
    let reply = tool.reply.as_deref().unwrap_or_default();

    if tool.tool == "create_file" {
        let details =
            serde_json::to_string_pretty(&tool.result).unwrap_or_else(|_| tool.result.to_string());
        return format!("{}\n\n{}", reply, details).trim_start().to_string();
    }

    if !reply.is_empty() {
        return reply.to_string();
    }

    tool.result
        .get("formatted")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| tool.result.to_string())
}
