//! python_run - execute a Python script
//!
//! Accepts either inline `code` (written to a scratch file) or a `path`
//! inside the workspace. The interpreter process is the only sandbox.

use crate::tool::{
    ParamKind, SafetyDecision, SafetyPolicy, Tool, ToolContext, ToolOutcome, ToolSchema,
};
use async_trait::async_trait;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub struct PythonRunTool;

impl PythonRunTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "python_run";

    const TIMEOUT_SECS: u64 = 15;

    fn find_interpreter() -> Option<PathBuf> {
        which::which("python3").or_else(|_| which::which("python")).ok()
    }
}

impl Default for PythonRunTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for PythonRunTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Execute a Python script from a path or inline code"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
            .optional("path", ParamKind::String, "Path to a Python script")
            .optional("code", ParamKind::String, "Inline Python code to run")
    }

    fn is_dangerous(&self) -> bool {
        true
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(Self::TIMEOUT_SECS)
    }

    fn safety_check(
        &self,
        params: &serde_json::Map<String, Value>,
        policy: &SafetyPolicy,
    ) -> SafetyDecision {
        // inline code runs from a scratch file; only a script path is
        // subject to workspace scoping
        match params.get("path").and_then(|v| v.as_str()) {
            Some(path) => policy.evaluate_path(path).decision,
            None => SafetyDecision::allow(),
        }
    }

    async fn execute(
        &self,
        params: &serde_json::Map<String, Value>,
        ctx: &ToolContext,
    ) -> ToolOutcome {
        let code = params.get("code").and_then(|v| v.as_str());
        let path = params.get("path").and_then(|v| v.as_str());

        if code.is_none() && path.is_none() {
            return ToolOutcome::error("missing required parameter: either 'path' or 'code'");
        }

        let Some(python) = Self::find_interpreter() else {
            return ToolOutcome::error("Python executable not found");
        };

        // keep the scratch file alive until the process finishes
        let mut scratch: Option<tempfile::NamedTempFile> = None;

        let script_path = match (code, path) {
            (Some(code), _) => {
                let mut file = match tempfile::Builder::new().suffix(".py").tempfile() {
                    Ok(file) => file,
                    Err(e) => {
                        return ToolOutcome::error(format!("Failed to create scratch file: {}", e))
                    }
                };
                if let Err(e) = file.write_all(code.as_bytes()) {
                    return ToolOutcome::error(format!("Failed to write scratch file: {}", e));
                }
                let path = file.path().to_path_buf();
                scratch = Some(file);
                path
            }
            (None, Some(path)) => {
                let resolved = ctx.policy.evaluate_path(path).resolved;
                if !resolved.exists() {
                    return ToolOutcome::error(format!(
                        "Script file not found: {}",
                        resolved.display()
                    ));
                }
                resolved
            }
            (None, None) => {
                return ToolOutcome::error("missing required parameter: either 'path' or 'code'")
            }
        };

        let mut cmd = Command::new(&python);
        cmd.arg(&script_path)
            .current_dir(&ctx.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &ctx.env {
            cmd.env(key, value);
        }

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => return ToolOutcome::error(format!("Failed to spawn interpreter: {}", e)),
        };

        drop(scratch);

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            if stdout.is_empty() {
                ToolOutcome::success("[Script executed without producing any output]")
            } else {
                ToolOutcome::success(stdout.into_owned())
            }
        } else {
            let exit_code = output.status.code().unwrap_or(-1);
            let mut detail = format!("Execution failed (code {})", exit_code);
            if !stderr.is_empty() {
                detail.push('\n');
                detail.push_str(&stderr);
            }
            if !stdout.is_empty() {
                detail.push_str("\n[stdout before failure]\n");
                detail.push_str(&stdout);
            }
            ToolOutcome::error(detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::PolicyMode;
    use serde_json::json;
    use tempfile::TempDir;

    fn params(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn ctx(dir: &TempDir) -> ToolContext {
        ToolContext::new(SafetyPolicy::new(PolicyMode::Safe, dir.path()))
    }

    #[tokio::test]
    async fn test_inline_code() {
        let dir = TempDir::new().unwrap();
        let outcome = PythonRunTool::new()
            .execute(&params(json!({"code": "print(2 + 2)"})), &ctx(&dir))
            .await;
        if PythonRunTool::find_interpreter().is_some() {
            assert!(outcome.success, "{:?}", outcome.error);
            assert_eq!(outcome.output.trim(), "4");
        } else {
            assert!(!outcome.success);
        }
    }

    #[tokio::test]
    async fn test_neither_param_is_error() {
        let dir = TempDir::new().unwrap();
        let outcome = PythonRunTool::new()
            .execute(&params(json!({})), &ctx(&dir))
            .await;
        assert!(!outcome.success);
        let error = outcome.error.unwrap();
        assert!(error.contains("path"));
        assert!(error.contains("code"));
    }

    #[tokio::test]
    async fn test_failing_script_reports_stderr() {
        let dir = TempDir::new().unwrap();
        if PythonRunTool::find_interpreter().is_none() {
            return;
        }
        let outcome = PythonRunTool::new()
            .execute(
                &params(json!({"code": "import sys; sys.exit('boom')"})),
                &ctx(&dir),
            )
            .await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("boom"));
    }

    #[test]
    fn test_script_path_scoped_to_workspace() {
        let dir = TempDir::new().unwrap();
        let policy = SafetyPolicy::new(PolicyMode::Safe, dir.path());
        let decision = PythonRunTool::new()
            .safety_check(&params(json!({"path": "../escape.py"})), &policy);
        assert!(!decision.is_allowed());
    }

    #[test]
    fn test_inline_code_allowed_by_policy() {
        let policy = SafetyPolicy::new(PolicyMode::Safe, "/tmp/ws");
        let decision =
            PythonRunTool::new().safety_check(&params(json!({"code": "print(1)"})), &policy);
        assert!(decision.is_allowed());
    }
}
