//! file_write - write content to a file in the workspace

use crate::tool::{
    ParamKind, SafetyDecision, SafetyPolicy, Tool, ToolContext, ToolOutcome, ToolSchema,
};
use async_trait::async_trait;
use serde_json::Value;

pub struct FileWriteTool;

impl FileWriteTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "file_write";
}

impl Default for FileWriteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Write content to a file"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
            .required("path", ParamKind::String, "Path to the file to write")
            .required("content", ParamKind::String, "Content to write")
    }

    fn safety_check(
        &self,
        params: &serde_json::Map<String, Value>,
        policy: &SafetyPolicy,
    ) -> SafetyDecision {
        let path = params.get("path").and_then(|v| v.as_str()).unwrap_or("");
        policy.evaluate_path(path).decision
    }

    async fn execute(
        &self,
        params: &serde_json::Map<String, Value>,
        ctx: &ToolContext,
    ) -> ToolOutcome {
        let path = params.get("path").and_then(|v| v.as_str()).unwrap_or("");
        let content = params.get("content").and_then(|v| v.as_str()).unwrap_or("");
        let resolved = ctx.policy.evaluate_path(path).resolved;

        if let Some(parent) = resolved.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return ToolOutcome::error(format!("Failed to create directory: {}", e));
            }
        }

        match std::fs::write(&resolved, content) {
            Ok(()) => ToolOutcome::success(format!(
                "Wrote {} bytes to {}",
                content.len(),
                resolved.display()
            )),
            Err(e) => ToolOutcome::error(format!("Failed to write file: {}", e)),
        }
    }
}
