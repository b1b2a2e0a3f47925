//! Tool system
//!
//! A tool is a named, side-effecting capability the model can invoke by
//! structured request. Tools declare a parameter schema and a danger flag;
//! the executor validates and gates every request before a handler runs.

pub mod builtin;
mod executor;
mod policy;
mod registry;

pub use executor::{ToolExecutor, ToolResult, ToolResultStatus};
pub use policy::{PathCheck, PolicyMode, SafetyDecision, SafetyPolicy, Verdict};
pub use registry::ToolRegistry;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Primitive parameter kinds accepted in tool schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamKind {
    /// Does a JSON value match this kind?
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
        }
    }
}

/// One declared parameter
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
}

/// Declared parameter schema for a tool
#[derive(Debug, Clone, Default)]
pub struct ToolSchema {
    pub required: Vec<ParamSpec>,
    pub optional: Vec<ParamSpec>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        self.required.push(ParamSpec {
            name,
            kind,
            description,
        });
        self
    }

    pub fn optional(mut self, name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        self.optional.push(ParamSpec {
            name,
            kind,
            description,
        });
        self
    }

    /// Validate supplied parameters, naming the offending parameter on
    /// failure. Extra parameters are tolerated.
    pub fn validate(&self, params: &serde_json::Map<String, Value>) -> Result<(), String> {
        for spec in &self.required {
            match params.get(spec.name) {
                None => return Err(format!("missing required parameter: {}", spec.name)),
                Some(v) if !spec.kind.matches(v) => {
                    return Err(format!(
                        "parameter '{}' must be a {}",
                        spec.name,
                        spec.kind.name()
                    ))
                }
                Some(_) => {}
            }
        }
        for spec in &self.optional {
            if let Some(v) = params.get(spec.name) {
                if !spec.kind.matches(v) {
                    return Err(format!(
                        "parameter '{}' must be a {}",
                        spec.name,
                        spec.kind.name()
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Payload a handler returns to the executor
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(message.into()),
        }
    }
}

/// Execution environment handed to tool handlers
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Working directory for file access and spawned processes
    pub working_dir: PathBuf,

    /// Safety policy in effect for this request
    pub policy: SafetyPolicy,

    /// Extra environment variables for spawned processes
    pub env: HashMap<String, String>,
}

impl ToolContext {
    pub fn new(policy: SafetyPolicy) -> Self {
        Self {
            working_dir: policy.workspace_root().to_path_buf(),
            policy,
            env: HashMap::new(),
        }
    }
}

/// A named, side-effecting capability
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used in tool markers
    fn name(&self) -> &'static str;

    /// One-line description for listings and the system prompt
    fn description(&self) -> &'static str;

    /// Declared parameter schema, checked by the executor before dispatch
    fn schema(&self) -> ToolSchema;

    /// True for shell and arbitrary code execution
    fn is_dangerous(&self) -> bool {
        false
    }

    /// Per-invocation timeout applied by the executor
    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    /// Policy gate, called after schema validation and before `execute`.
    /// A deny here means the handler is never invoked.
    fn safety_check(
        &self,
        _params: &serde_json::Map<String, Value>,
        _policy: &SafetyPolicy,
    ) -> SafetyDecision {
        SafetyDecision::allow()
    }

    /// Invoke the capability with validated parameters
    async fn execute(
        &self,
        params: &serde_json::Map<String, Value>,
        ctx: &ToolContext,
    ) -> ToolOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ToolSchema {
        ToolSchema::new()
            .required("path", ParamKind::String, "file path")
            .optional("limit", ParamKind::Integer, "max lines")
    }

    fn params(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_schema_accepts_valid() {
        assert!(schema().validate(&params(json!({"path": "a.txt"}))).is_ok());
        assert!(schema()
            .validate(&params(json!({"path": "a.txt", "limit": 10})))
            .is_ok());
    }

    #[test]
    fn test_schema_names_missing_param() {
        let err = schema().validate(&params(json!({}))).unwrap_err();
        assert!(err.contains("path"));
    }

    #[test]
    fn test_schema_names_mistyped_param() {
        let err = schema()
            .validate(&params(json!({"path": 42})))
            .unwrap_err();
        assert!(err.contains("path"));
        assert!(err.contains("string"));

        let err = schema()
            .validate(&params(json!({"path": "a", "limit": "ten"})))
            .unwrap_err();
        assert!(err.contains("limit"));
    }

    #[test]
    fn test_schema_tolerates_extras() {
        assert!(schema()
            .validate(&params(json!({"path": "a.txt", "junk": true})))
            .is_ok());
    }
}
