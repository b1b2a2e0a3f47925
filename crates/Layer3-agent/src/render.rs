//! Rendering tool results into transcript text
//!
//! Result turns are read by two audiences: the user scanning the REPL and
//! the model on its next call. Markdown headings and fenced output keep
//! both readable.

use ollamacode_core::{ToolResult, ToolResultStatus};

/// Terminal notice appended when follow-up recursion hits its limit
pub const DEPTH_LIMIT_NOTICE: &str =
    "Follow-up depth limit reached. Remaining tool requests were not executed.";

/// Render one tool result as a transcript turn
pub fn tool_result_turn(result: &ToolResult) -> String {
    match result.status {
        ToolResultStatus::Ok => {
            if result.output.is_empty() {
                format!("## Tool Result: `{}`\n\n(no output)", result.tool)
            } else {
                format!(
                    "## Tool Result: `{}`\n\n```\n{}\n```",
                    result.tool, result.output
                )
            }
        }
        ToolResultStatus::Error => format!(
            "## Tool Result: `{}`\n\nExecution failed: {}",
            result.tool,
            result.detail.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// Render a turn-level failure (model unreachable, interrupt, ...)
pub fn error_turn(context: &str, detail: &str) -> String {
    format!("[error] {}: {}", context, detail)
}

/// Render a saved-code notice
pub fn code_saved_turn(lang: &str, path: &std::path::Path) -> String {
    let lang = if lang.is_empty() { "code" } else { lang };
    format!("Saved {} block to {}", lang, path.display())
}
