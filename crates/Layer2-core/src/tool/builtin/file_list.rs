//! file_list - list a directory in the workspace

use crate::tool::{
    ParamKind, SafetyDecision, SafetyPolicy, Tool, ToolContext, ToolOutcome, ToolSchema,
};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde_json::Value;

pub struct FileListTool;

impl FileListTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "file_list";
}

impl Default for FileListTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FileListTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "List files in a directory"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().optional(
            "directory",
            ParamKind::String,
            "Directory to list (default: workspace root)",
        )
    }

    fn safety_check(
        &self,
        params: &serde_json::Map<String, Value>,
        policy: &SafetyPolicy,
    ) -> SafetyDecision {
        let directory = params
            .get("directory")
            .and_then(|v| v.as_str())
            .unwrap_or(".");
        policy.evaluate_path(directory).decision
    }

    async fn execute(
        &self,
        params: &serde_json::Map<String, Value>,
        ctx: &ToolContext,
    ) -> ToolOutcome {
        let directory = params
            .get("directory")
            .and_then(|v| v.as_str())
            .unwrap_or(".");
        let resolved = ctx.policy.evaluate_path(directory).resolved;

        if !resolved.exists() {
            return ToolOutcome::error(format!("Directory not found: {}", resolved.display()));
        }
        if !resolved.is_dir() {
            return ToolOutcome::error(format!("Not a directory: {}", resolved.display()));
        }

        let entries = match std::fs::read_dir(&resolved) {
            Ok(entries) => entries,
            Err(e) => return ToolOutcome::error(format!("Failed to list directory: {}", e)),
        };

        struct Entry {
            name: String,
            is_dir: bool,
            size: u64,
            modified: Option<DateTime<Local>>,
        }

        let mut items: Vec<Entry> = Vec::new();
        for entry in entries.flatten() {
            let meta = entry.metadata().ok();
            items.push(Entry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: meta.as_ref().map(|m| m.is_dir()).unwrap_or(false),
                size: meta.as_ref().map(|m| m.len()).unwrap_or(0),
                modified: meta
                    .and_then(|m| m.modified().ok())
                    .map(DateTime::<Local>::from),
            });
        }

        // directories first, then case-insensitive by name
        items.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        let mut output = format!("Contents of {} ({} items):\n", resolved.display(), items.len());
        for item in items {
            let modified = item
                .modified
                .map(|t| t.format(" %Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            if item.is_dir {
                output.push_str(&format!("📁 {}/{}\n", item.name, modified));
            } else {
                output.push_str(&format!("📄 {} ({} bytes){}\n", item.name, item.size, modified));
            }
        }

        ToolOutcome::success(output)
    }
}
