//! Plain-text rendering of chat messages and sources.

use backboard_core::{ChatMessage, SourceFile};

/// Characters of raw source text shown under each label
const PREVIEW_CHARS: usize = 80;

/// One-line summary of a classified source
pub fn source_line(source: &SourceFile) -> String {
    format!("[{}] {}", source.source_type, source.source_label)
}

/// Assistant reply followed by a numbered source list
pub fn message_text(msg: &ChatMessage) -> String {
    let mut out = msg.content.clone();

    if let Some(sources) = msg.sources.as_deref().filter(|s| !s.is_empty()) {
        out.push_str("\n\nSources:");
        for (i, source) in sources.iter().enumerate() {
            out.push_str(&format!("\n  {}. {}", i + 1, source_line(source)));
            out.push_str(&format!("\n     {}", preview(&source.content, PREVIEW_CHARS)));
        }
    }

    out
}

/// First line of `input`, cut to `max_chars` with an ellipsis when shortened
pub fn preview(input: &str, max_chars: usize) -> String {
    let first_line = input.lines().next().unwrap_or_default().trim();
    if first_line.chars().count() <= max_chars && !input.trim().contains('\n') {
        return first_line.to_string();
    }
    let cut: String = first_line.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use backboard_core::classify;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("ééééé", 3), "ééé...");
        assert_eq!(preview("line one\nline two", 80), "line one...");
        assert_eq!(preview("", 10), "");
    }

    #[test]
    fn test_message_text_lists_sources() {
        let msg = ChatMessage::assistant("Answer").with_sources(vec![
            classify("a1b2c3d karan: fix login"),
            classify("the quick brown fox"),
        ]);
        let text = message_text(&msg);
        assert!(text.starts_with("Answer\n\nSources:"));
        assert!(text.contains("1. [git] Git Commit - a1b2c3d by karan"));
        assert!(text.contains("2. [unknown] Retrieved Context"));
    }

    #[test]
    fn test_message_text_without_sources() {
        assert_eq!(message_text(&ChatMessage::assistant("Just this")), "Just this");
    }
}
