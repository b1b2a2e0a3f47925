//! Tool executor
//!
//! Runs one validated request through the registry, the safety policy, and
//! the handler, funneling every failure mode into a `ToolResult` instead of
//! an error path. Side effects happen exactly once per request; retries are
//! a decision for the model on a later turn, not for this component.

use super::{SafetyPolicy, ToolContext, ToolRegistry};
use crate::parser::{RequestParams, ToolRequest};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;

/// Result status of one tool execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolResultStatus {
    Ok,
    Error,
}

/// Immutable record of one tool execution
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Name from the originating request
    pub tool: String,

    pub status: ToolResultStatus,

    /// Captured output, truncated to `MAX_OUTPUT_CHARS`
    pub output: String,

    /// Present iff status is `Error`
    pub detail: Option<String>,
}

impl ToolResult {
    pub fn is_ok(&self) -> bool {
        self.status == ToolResultStatus::Ok
    }

    fn ok(tool: &str, output: String) -> Self {
        Self {
            tool: tool.to_string(),
            status: ToolResultStatus::Ok,
            output,
            detail: None,
        }
    }

    fn error(tool: &str, detail: impl Into<String>) -> Self {
        Self {
            tool: tool.to_string(),
            status: ToolResultStatus::Error,
            output: String::new(),
            detail: Some(detail.into()),
        }
    }
}

/// Executes parsed tool requests under a safety policy
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    ctx: ToolContext,
}

impl ToolExecutor {
    /// Result text is re-injected into model context; unbounded growth
    /// would degrade every later turn
    pub const MAX_OUTPUT_CHARS: usize = 10_000;

    /// Diagnostics get a tighter bound than payload output
    const MAX_DETAIL_CHARS: usize = 2_000;

    pub fn new(registry: Arc<ToolRegistry>, policy: SafetyPolicy) -> Self {
        Self {
            ctx: ToolContext::new(policy),
            registry,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Execute one request end to end
    pub async fn execute(&self, request: &ToolRequest) -> ToolResult {
        let name = request.name.as_str();
        let start = Instant::now();

        // 1. Registry lookup; unknown names never reach a handler
        let Some(tool) = self.registry.lookup(name) else {
            let shown = if name.is_empty() { "(unnamed)" } else { name };
            return ToolResult::error(name, format!("unknown tool: {}", shown));
        };

        // 2. Unparseable payloads are reported, not executed
        let params = match &request.params {
            RequestParams::Json(map) => map,
            RequestParams::Unparseable(raw) => {
                return ToolResult::error(
                    name,
                    format!("unparseable parameters: {}", truncate(raw, 200)),
                );
            }
        };

        // 3. Schema validation, naming the offending parameter
        if let Err(message) = tool.schema().validate(params) {
            return ToolResult::error(name, message);
        }

        // 4. Safety policy; deny means the handler is never invoked
        let decision = tool.safety_check(params, &self.ctx.policy);
        if !decision.is_allowed() {
            tracing::info!(tool = name, rule = ?decision.matched_rule, "request denied by policy");
            return ToolResult::error(name, decision.reason_text());
        }

        // 5. Timed handler invocation
        let outcome = match timeout(tool.timeout(), tool.execute(params, &self.ctx)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                return ToolResult::error(
                    name,
                    format!("execution timed out after {:?}", tool.timeout()),
                );
            }
        };

        tracing::debug!(
            tool = name,
            success = outcome.success,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "tool executed"
        );

        if outcome.success {
            ToolResult::ok(name, truncate_output(&outcome.output))
        } else {
            let detail = outcome
                .error
                .unwrap_or_else(|| "unknown failure".to_string());
            ToolResult::error(name, truncate(&detail, Self::MAX_DETAIL_CHARS))
        }
    }
}

/// Bound output size, appending an explicit truncation marker
fn truncate_output(output: &str) -> String {
    if output.len() <= ToolExecutor::MAX_OUTPUT_CHARS {
        return output.to_string();
    }
    let cut = floor_char_boundary(output, ToolExecutor::MAX_OUTPUT_CHARS);
    format!(
        "{}\n... (output truncated, total size: {} bytes)",
        &output[..cut],
        output.len()
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let cut = floor_char_boundary(text, max);
    format!("{}...", &text[..cut])
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
