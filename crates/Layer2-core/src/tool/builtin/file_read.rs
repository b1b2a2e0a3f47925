//! file_read - read a file from the workspace

use crate::tool::{
    ParamKind, SafetyDecision, SafetyPolicy, Tool, ToolContext, ToolOutcome, ToolSchema,
};
use async_trait::async_trait;
use serde_json::Value;

pub struct FileReadTool;

impl FileReadTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "file_read";

    /// Reading larger files would blow the model context anyway
    const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
}

impl Default for FileReadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Read a file's contents"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().required("path", ParamKind::String, "Path to the file to read")
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
        let resolved = ctx.policy.evaluate_path(path).resolved;

        if !resolved.exists() {
            return ToolOutcome::error(format!("File not found: {}", resolved.display()));
        }
        if !resolved.is_file() {
            return ToolOutcome::error(format!("Not a file: {}", resolved.display()));
        }

        match std::fs::metadata(&resolved) {
            Ok(meta) if meta.len() > Self::MAX_FILE_BYTES => {
                return ToolOutcome::error(format!(
                    "File too large ({:.2} MB). Maximum size is 10MB.",
                    meta.len() as f64 / 1024.0 / 1024.0
                ));
            }
            Ok(_) => {}
            Err(e) => return ToolOutcome::error(format!("Failed to stat file: {}", e)),
        }

        match std::fs::read(&resolved) {
            Ok(bytes) => ToolOutcome::success(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => ToolOutcome::error(format!("Failed to read file: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::PolicyMode;
    use serde_json::json;
    use tempfile::TempDir;

    fn ctx(dir: &TempDir) -> ToolContext {
        ToolContext::new(SafetyPolicy::new(PolicyMode::Safe, dir.path()))
    }

    fn params(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_read_relative_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "contents").unwrap();

        let outcome = FileReadTool::new()
            .execute(&params(json!({"path": "a.txt"})), &ctx(&dir))
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.output, "contents");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let outcome = FileReadTool::new()
            .execute(&params(json!({"path": "nope.txt"})), &ctx(&dir))
            .await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("not found"));
    }

    #[test]
    fn test_safety_check_denies_escape() {
        let dir = TempDir::new().unwrap();
        let policy = SafetyPolicy::new(PolicyMode::Safe, dir.path());
        let decision =
            FileReadTool::new().safety_check(&params(json!({"path": "../outside.txt"})), &policy);
        assert!(!decision.is_allowed());
    }
}
