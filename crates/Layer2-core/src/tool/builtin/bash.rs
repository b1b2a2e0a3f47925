//! bash - shell command execution
//!
//! The command string goes to `sh -c` after the safety policy has screened
//! it. Output is captured and size-bounded; the executor enforces the
//! timeout and the child is killed when the execution future is dropped.

use crate::tool::{
    ParamKind, SafetyDecision, SafetyPolicy, Tool, ToolContext, ToolOutcome, ToolSchema,
};
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub struct BashTool;

impl BashTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "bash";

    const TIMEOUT_SECS: u64 = 30;
}

impl Default for BashTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Execute a shell command in the workspace"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().required("command", ParamKind::String, "The command to execute")
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
        let command = params.get("command").and_then(|v| v.as_str()).unwrap_or("");
        policy.evaluate_command(command)
    }

    async fn execute(
        &self,
        params: &serde_json::Map<String, Value>,
        ctx: &ToolContext,
    ) -> ToolOutcome {
        let command = params.get("command").and_then(|v| v.as_str()).unwrap_or("");
        if command.trim().is_empty() {
            return ToolOutcome::error("Command cannot be empty");
        }

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .current_dir(&ctx.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &ctx.env {
            cmd.env(key, value);
        }

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => return ToolOutcome::error(format!("Failed to spawn process: {}", e)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut combined = String::new();
        if !stdout.is_empty() {
            combined.push_str(&stdout);
        }
        if !stderr.is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str("[stderr]\n");
            combined.push_str(&stderr);
        }

        let exit_code = output.status.code().unwrap_or(-1);
        if output.status.success() {
            if combined.is_empty() {
                ToolOutcome::success("[Command completed successfully with no output]")
            } else {
                ToolOutcome::success(combined)
            }
        } else if combined.is_empty() {
            ToolOutcome::error(format!("Command failed with exit code {}", exit_code))
        } else {
            ToolOutcome::error(format!("Exit code {}\n{}", exit_code, combined))
        }
    }
}
