//! Safety policy
//!
//! Decides whether a requested command, path, or URL is permitted under the
//! current mode. Command screening is substring/pattern based and
//! deliberately conservative: a false deny costs one model turn, a false
//! allow costs a filesystem.

use ollamacode_foundation::security::{command_analyzer, validate_url, PathValidator};
use std::path::{Path, PathBuf};

/// Policy mode for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    /// Deny-list commands, workspace-scoped paths, public URLs only
    Safe,
    /// Everything allowed
    Unrestricted,
}

/// Allow or deny
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny,
}

/// Outcome of one policy evaluation; ephemeral, never persisted
#[derive(Debug, Clone)]
pub struct SafetyDecision {
    pub verdict: Verdict,

    /// Rule that fired, for diagnostics
    pub matched_rule: Option<String>,

    /// Human-readable reason suitable for a transcript turn
    pub reason: Option<String>,
}

impl SafetyDecision {
    pub fn allow() -> Self {
        Self {
            verdict: Verdict::Allow,
            matched_rule: None,
            reason: None,
        }
    }

    pub fn deny(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Deny,
            matched_rule: Some(rule.into()),
            reason: Some(reason.into()),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.verdict == Verdict::Allow
    }

    /// Reason text, with a fallback for callers that must print something
    pub fn reason_text(&self) -> String {
        self.reason
            .clone()
            .unwrap_or_else(|| "denied by safety policy".to_string())
    }
}

/// Result of a path evaluation: the decision plus the resolved path the
/// tool should use when allowed
#[derive(Debug, Clone)]
pub struct PathCheck {
    pub decision: SafetyDecision,
    pub resolved: PathBuf,
}

/// The safety policy for one turn
#[derive(Debug, Clone)]
pub struct SafetyPolicy {
    mode: PolicyMode,
    workspace_root: PathBuf,
}

impl SafetyPolicy {
    pub fn new(mode: PolicyMode, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            workspace_root: workspace_root.into(),
        }
    }

    pub fn safe(workspace_root: impl Into<PathBuf>) -> Self {
        Self::new(PolicyMode::Safe, workspace_root)
    }

    pub fn unrestricted(workspace_root: impl Into<PathBuf>) -> Self {
        Self::new(PolicyMode::Unrestricted, workspace_root)
    }

    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Evaluate a shell command against the deny-list
    pub fn evaluate_command(&self, command: &str) -> SafetyDecision {
        if self.mode == PolicyMode::Unrestricted {
            tracing::warn!(command, "safe mode off, allowing command unchecked");
            return SafetyDecision::allow();
        }

        let analysis = command_analyzer().analyze(command);
        if analysis.risk.is_blocked() {
            tracing::warn!(command, reason = ?analysis.reason, "command blocked");
            return SafetyDecision {
                verdict: Verdict::Deny,
                matched_rule: analysis.matched_pattern,
                reason: Some(format!(
                    "Command not allowed: {}",
                    analysis.reason.unwrap_or_else(|| "forbidden pattern".to_string())
                )),
            };
        }

        SafetyDecision::allow()
    }

    /// Evaluate a file path; relative paths are anchored at the workspace
    /// root either way, but only safe mode denies escapes
    pub fn evaluate_path(&self, path: &str) -> PathCheck {
        if self.mode == PolicyMode::Unrestricted {
            let resolved = anchor(&self.workspace_root, path);
            tracing::warn!(path, "safe mode off, allowing path unchecked");
            return PathCheck {
                decision: SafetyDecision::allow(),
                resolved,
            };
        }

        let validator = PathValidator::new(&self.workspace_root);
        let validation = validator.validate(Path::new(path));
        match validation {
            ollamacode_foundation::security::PathValidation::Valid(resolved) => PathCheck {
                decision: SafetyDecision::allow(),
                resolved,
            },
            other => {
                let reason = other
                    .error_message()
                    .unwrap_or_else(|| "path denied".to_string());
                tracing::warn!(path, %reason, "path blocked");
                PathCheck {
                    decision: SafetyDecision::deny("path", reason),
                    resolved: anchor(&self.workspace_root, path),
                }
            }
        }
    }

    /// Evaluate an outbound URL
    pub fn evaluate_url(&self, url: &str) -> SafetyDecision {
        if self.mode == PolicyMode::Unrestricted {
            return SafetyDecision::allow();
        }

        let validation = validate_url(url);
        if let Some(reason) = validation.error_message() {
            tracing::warn!(url, %reason, "url blocked");
            return SafetyDecision::deny("url", reason);
        }
        SafetyDecision::allow()
    }
}

fn anchor(root: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    let absolute = if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    };
    ollamacode_foundation::security::normalize_path(&absolute)
}
