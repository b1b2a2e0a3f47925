//! Error types for OllamaCode

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// OllamaCode error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Safety policy
    // ========================================================================
    #[error("Denied by safety policy: {0}")]
    PolicyDenied(String),

    // ========================================================================
    // Tools
    // ========================================================================
    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters for '{tool}': {message}")]
    SchemaViolation { tool: String, message: String },

    // ========================================================================
    // Model collaborator
    // ========================================================================
    #[error("Model server error: {0}")]
    Collaborator(String),

    // ========================================================================
    // Execution
    // ========================================================================
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled")]
    Cancelled,

    // ========================================================================
    // General
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // External error conversions
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Fallback
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Errors that should be surfaced as a transcript turn rather than
    /// aborting the REPL
    pub fn is_turn_level(&self) -> bool {
        !matches!(self, Error::Internal(_))
    }

    /// Schema violation helper
    pub fn schema(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::SchemaViolation {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_helper() {
        let err = Error::schema("file_read", "missing required parameter: path");
        assert!(err.to_string().contains("file_read"));
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_turn_level() {
        assert!(Error::PolicyDenied("rm -rf /".into()).is_turn_level());
        assert!(Error::Collaborator("connection refused".into()).is_turn_level());
        assert!(!Error::Internal("allocator".into()).is_turn_level());
    }
}
