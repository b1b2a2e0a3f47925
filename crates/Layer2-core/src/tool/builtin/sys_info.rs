//! sys_info - host and environment summary

use crate::tool::{Tool, ToolContext, ToolOutcome, ToolSchema};
use async_trait::async_trait;
use chrono::Local;
use serde_json::Value;

pub struct SysInfoTool;

impl SysInfoTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "sys_info";

    /// Environment variables safe to echo into model context
    const SAFE_ENV_VARS: &'static [&'static str] =
        &["PATH", "USER", "HOME", "SHELL", "LANG", "PWD", "TERM"];
}

impl Default for SysInfoTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SysInfoTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Get system information"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
    }

    async fn execute(
        &self,
        _params: &serde_json::Map<String, Value>,
        ctx: &ToolContext,
    ) -> ToolOutcome {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());

        let mut output = String::new();
        output.push_str(&format!("OS: {}\n", std::env::consts::OS));
        output.push_str(&format!("Architecture: {}\n", std::env::consts::ARCH));
        output.push_str(&format!("Hostname: {}\n", host));
        output.push_str(&format!("Time: {}\n", Local::now().to_rfc3339()));
        output.push_str(&format!(
            "Working directory: {}\n",
            ctx.working_dir.display()
        ));

        output.push_str("\nEnvironment:\n");
        for var in Self::SAFE_ENV_VARS {
            if let Ok(value) = std::env::var(var) {
                output.push_str(&format!("  {}={}\n", var, value));
            }
        }

        ToolOutcome::success(output)
    }
}
