//! Core domain types for backboard
//!
//! These types are the uniform records the gateway hands back to callers,
//! whatever shape the backend reply had on the wire.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Source string** | Opaque evidence fragment the backend returns alongside an answer |
//! | **Provenance** | Where a source came from: Telegram chat, git history, Google Drive, or unknown |
//! | **File context** | Snapshot of user-selected file text attached to one outgoing prompt |
//! | **Tool directive** | An in-band `@name` token the backend treats as an action request |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// ============================================
// Chat messages
// ============================================

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn in a conversation.
///
/// Produced by the gateway for every request/response pair and never mutated
/// afterwards; conversation history is owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Classified sources, absent when the backend returned none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceFile>>,
    /// File context attached to a user prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<FileContext>,
    /// Structured tool result from the send endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolResult>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            sources: None,
            context: None,
            tool_result: None,
        }
    }

    /// A prompt typed by the user, optionally carrying a file attachment
    pub fn user(content: impl Into<String>, context: Option<FileContext>) -> Self {
        Self {
            context,
            ..Self::new(Role::User, content)
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attach sources; an empty list leaves `sources` unset
    pub fn with_sources(mut self, sources: Vec<SourceFile>) -> Self {
        self.sources = if sources.is_empty() {
            None
        } else {
            Some(sources)
        };
        self
    }

    pub fn with_tool_result(mut self, tool_result: ToolResult) -> Self {
        self.tool_result = Some(tool_result);
        self
    }

    /// Number of attached sources
    pub fn source_count(&self) -> usize {
        self.sources.as_ref().map_or(0, Vec::len)
    }
}

// ============================================
// Sources
// ============================================

/// Provenance category of a source string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Telegram,
    Drive,
    Git,
    Unknown,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Telegram => "telegram",
            SourceType::Drive => "drive",
            SourceType::Git => "git",
            SourceType::Unknown => "unknown",
        }
    }

    /// Synthetic grouping key used as `SourceFile::path`
    pub fn bucket(&self) -> &'static str {
        match self {
            SourceType::Telegram => "telegram",
            SourceType::Drive => "drive",
            SourceType::Git => "git",
            SourceType::Unknown => "memory",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "telegram" => Ok(SourceType::Telegram),
            "drive" => Ok(SourceType::Drive),
            "git" => Ok(SourceType::Git),
            "unknown" => Ok(SourceType::Unknown),
            _ => Err(format!("unknown source type: {}", s)),
        }
    }
}

/// A provenance-tagged fragment returned alongside an assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    /// Grouping sentinel, not a filesystem path
    pub path: String,
    pub source_type: SourceType,
    pub source_label: String,
    /// The raw source string, unmodified
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end: Option<u32>,
}

// ============================================
// File context
// ============================================

/// Snapshot of editor-selected text attached to one prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContext {
    pub file_name: String,
    pub file_path: PathBuf,
    pub content: String,
    /// 1-based, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end: Option<u32>,
}

impl FileContext {
    /// Read a file from disk, optionally narrowed to a 1-based inclusive line range.
    ///
    /// `file_name` is the path as given, which keeps it relative when the
    /// caller passed a relative path.
    pub fn from_file(path: &Path, lines: Option<(u32, u32)>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let file_name = path.display().to_string();
        let file_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        match lines {
            None => Ok(Self {
                file_name,
                file_path,
                content: text,
                line_start: None,
                line_end: None,
            }),
            Some((start, end)) => {
                if start == 0 || end < start {
                    return Err(Error::Config(format!(
                        "invalid line range {}-{}",
                        start, end
                    )));
                }
                let content = text
                    .lines()
                    .skip(start as usize - 1)
                    .take((end - start + 1) as usize)
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(Self {
                    file_name,
                    file_path,
                    content,
                    line_start: Some(start),
                    line_end: Some(end),
                })
            }
        }
    }

    /// Both ends of the line range, when a selection was attached
    pub fn line_range(&self) -> Option<(u32, u32)> {
        self.line_start.zip(self.line_end)
    }
}

// ============================================
// Tool results
// ============================================

/// Structured reply from `/messages/send` for a recognized tool directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool name, e.g. `create_file`
    pub tool: String,
    #[serde(default)]
    pub result: serde_json::Value,
    /// Human-readable reply accompanying the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

// ============================================
// Dashboard reads
// ============================================

/// Response of `GET /system/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub client: ClientStatus,
    #[serde(default)]
    pub drive: ServiceStatus,
    #[serde(default)]
    pub telegram: ServiceStatus,
    #[serde(default)]
    pub codebase: ServiceStatus,
}

/// Registration state of the configured client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientStatus {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub has_api_key: bool,
}

/// Connection state of one ingestion source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_count: Option<u64>,
    #[serde(default, rename = "lastUpdated", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// One row of `GET /activity`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_with_sources_omits_empty_list() {
        let msg = ChatMessage::assistant("hi").with_sources(vec![]);
        assert!(msg.sources.is_none());
        assert_eq!(msg.source_count(), 0);

        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("sources").is_none());
        assert_eq!(json["role"], "assistant");
    }

    #[test]
    fn test_user_message_carries_context() {
        let ctx = FileContext {
            file_name: "lib.rs".to_string(),
            file_path: "/w/lib.rs".into(),
            content: "pub fn x() {}".to_string(),
            line_start: None,
            line_end: None,
        };
        let json = serde_json::to_value(ChatMessage::user("why?", Some(ctx))).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["context"]["fileName"], "lib.rs");
    }

    #[test]
    fn test_source_file_uses_camel_case_keys() {
        let source = SourceFile {
            path: "git".to_string(),
            source_type: SourceType::Git,
            source_label: "Git Repository History".to_string(),
            content: "commit abc".to_string(),
            line_start: None,
            line_end: None,
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["sourceType"], "git");
        assert_eq!(json["sourceLabel"], "Git Repository History");
        assert!(json.get("lineStart").is_none());
    }

    #[test]
    fn test_source_type_round_trips_through_str() {
        for ty in [
            SourceType::Telegram,
            SourceType::Drive,
            SourceType::Git,
            SourceType::Unknown,
        ] {
            assert_eq!(ty.as_str().parse::<SourceType>().unwrap(), ty);
        }
        assert!("jira".parse::<SourceType>().is_err());
        assert_eq!(SourceType::Unknown.bucket(), "memory");
    }

    #[test]
    fn test_file_context_line_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "one\ntwo\nthree\nfour").unwrap();

        let ctx = FileContext::from_file(file.path(), Some((2, 3))).unwrap();
        assert_eq!(ctx.content, "two\nthree");
        assert_eq!(ctx.line_range(), Some((2, 3)));

        let whole = FileContext::from_file(file.path(), None).unwrap();
        assert_eq!(whole.content, "one\ntwo\nthree\nfour\n");
        assert_eq!(whole.line_range(), None);

        assert!(FileContext::from_file(file.path(), Some((0, 2))).is_err());
        assert!(FileContext::from_file(file.path(), Some((3, 2))).is_err());
    }

    #[test]
    fn test_parse_system_status() {
        let json = r#"{
            "client": {"id": "default_user", "exists": true, "has_api_key": true},
            "drive": {"connected": true, "document_count": 2, "lastUpdated": "2026-01-10"},
            "telegram": {"connected": false, "lastUpdated": null},
            "codebase": {"connected": true, "lastUpdated": "2026-01-12 10:00 UTC"}
        }"#;
        let status: SystemStatus = serde_json::from_str(json).unwrap();
        assert!(status.client.exists);
        assert_eq!(status.drive.document_count, Some(2));
        assert_eq!(status.drive.last_updated.as_deref(), Some("2026-01-10"));
        assert!(!status.telegram.connected);
        assert!(status.telegram.last_updated.is_none());
    }
}
