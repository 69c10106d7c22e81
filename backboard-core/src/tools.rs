//! In-band tool directives
//!
//! A prompt carrying an `@identifier` token (e.g. `@create_file`,
//! `@get_recent_context`) asks the backend for a structured action instead of
//! a free-text answer. Such prompts go to `/messages/send`, which may answer
//! with a [`ToolResult`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::ToolResult;

static DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(\w+)").expect("directive pattern is valid"));

/// Name of the tool that asks the host to write a file into the workspace
pub const CREATE_FILE_TOOL: &str = "create_file";

/// The first `@name` token found in a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDirective {
    pub name: String,
}

impl ToolDirective {
    pub fn parse(prompt: &str) -> Option<Self> {
        DIRECTIVE.captures(prompt).map(|caps| ToolDirective {
            name: caps[1].to_string(),
        })
    }
}

/// Payload of a `create_file` tool result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFileRequest {
    /// Workspace-relative path proposed by the backend
    pub filename: String,
    pub content: String,
}

impl CreateFileRequest {
    /// Extract the request from a tool result.
    ///
    /// Returns `Ok(None)` for other tools and an error when a `create_file`
    /// result lacks a filename or content.
    pub fn from_tool_result(tool: &ToolResult) -> Result<Option<Self>> {
        if tool.tool != CREATE_FILE_TOOL {
            return Ok(None);
        }

        let field = |name: &str| {
            tool.result
                .get(name)
                .and_then(Value::as_str)
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        };

        let filename = field("filename")
            .ok_or_else(|| Error::InvalidToolResult("create_file is missing filename".to_string()))?;
        let content = field("content")
            .ok_or_else(|| Error::InvalidToolResult("create_file is missing content".to_string()))?;

        Ok(Some(Self { filename, content }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_directive() {
        assert_eq!(
            ToolDirective::parse("please @create_file for onboarding"),
            Some(ToolDirective {
                name: "create_file".to_string()
            })
        );
        assert_eq!(
            ToolDirective::parse("@get_recent_context then @source")
                .unwrap()
                .name,
            "get_recent_context"
        );
        assert!(ToolDirective::parse("no directives here").is_none());
        assert!(ToolDirective::parse("trailing @").is_none());
    }

    #[test]
    fn test_create_file_request() {
        let tool = ToolResult {
            tool: "create_file".to_string(),
            result: json!({"filename": "docs/ONBOARDING.md", "content": "# Welcome"}),
            reply: None,
        };
        let request = CreateFileRequest::from_tool_result(&tool).unwrap().unwrap();
        assert_eq!(request.filename, "docs/ONBOARDING.md");
        assert_eq!(request.content, "# Welcome");
    }

    #[test]
    fn test_create_file_requires_fields() {
        let tool = ToolResult {
            tool: "create_file".to_string(),
            result: json!({"filename": "  ", "content": "x"}),
            reply: None,
        };
        assert!(CreateFileRequest::from_tool_result(&tool).is_err());

        let tool = ToolResult {
            tool: "create_file".to_string(),
            result: json!({"filename": "a.md"}),
            reply: None,
        };
        assert!(CreateFileRequest::from_tool_result(&tool).is_err());
    }

    #[test]
    fn test_other_tools_are_ignored() {
        let tool = ToolResult {
            tool: "generate_mermaid_graph".to_string(),
            result: json!({"formatted": "graph TD"}),
            reply: None,
        };
        assert_eq!(CreateFileRequest::from_tool_result(&tool).unwrap(), None);
    }
}
