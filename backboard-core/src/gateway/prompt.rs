//! Outgoing prompt construction

use crate::types::FileContext;

/// Build the string actually transmitted for a prompt.
///
/// An attached file is inlined ahead of the prompt under a bracketed header;
/// the structured context is never sent as separate metadata.
pub fn build_prompt(prompt: &str, context: Option<&FileContext>) -> String {
    let Some(ctx) = context else {
        return prompt.to_string();
    };

    let header = match ctx.line_range() {
        Some((start, end)) => format!("[Context from {} lines {}-{}]", ctx.file_name, start, end),
        None => format!("[Context from {}]", ctx.file_name),
    };

    format!("{}:\n{}\n\n{}", header, ctx.content, prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn context(lines: Option<(u32, u32)>) -> FileContext {
        FileContext {
            file_name: "src/server.rs".to_string(),
            file_path: PathBuf::from("/work/src/server.rs"),
            content: "fn main() {}".to_string(),
            line_start: lines.map(|(s, _)| s),
            line_end: lines.map(|(_, e)| e),
        }
    }

    #[test]
    fn test_no_context_passes_prompt_through() {
        assert_eq!(build_prompt("why?", None), "why?");
    }

    #[test]
    fn test_context_with_line_range() {
        let ctx = context(Some((3, 9)));
        assert_eq!(
            build_prompt("what does this do?", Some(&ctx)),
            "[Context from src/server.rs lines 3-9]:\nfn main() {}\n\nwhat does this do?"
        );
    }

    #[test]
    fn test_context_without_line_range() {
        let ctx = context(None);
        assert_eq!(
            build_prompt("explain", Some(&ctx)),
            "[Context from src/server.rs]:\nfn main() {}\n\nexplain"
        );
    }

    #[test]
    fn test_half_open_range_uses_file_header() {
        let mut ctx = context(None);
        ctx.line_start = Some(4);
        assert!(build_prompt("x", Some(&ctx)).starts_with("[Context from src/server.rs]:"));
    }
}
