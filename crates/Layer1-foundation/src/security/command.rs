//! Command risk classification
//!
//! Classifies shell command strings into risk buckets. Forbidden patterns
//! are always blocked in safe mode; the remaining buckets exist so callers
//! can log and report with some precision.

use regex::Regex;
use std::sync::OnceLock;

/// Command risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandRisk {
    /// Read-only or informational (ls, pwd, git status, ...)
    Safe,
    /// Mutating but routine (mkdir, cp, git commit, ...)
    Caution,
    /// Destructive potential (rm, mv, git push --force, ...)
    Dangerous,
    /// Always blocked in safe mode (rm -rf /, fork bomb, ...)
    Forbidden,
    /// Not in any list
    Unknown,
}

impl CommandRisk {
    pub fn is_blocked(&self) -> bool {
        matches!(self, CommandRisk::Forbidden)
    }
}

/// Result of analyzing a command string
#[derive(Debug, Clone)]
pub struct CommandAnalysis {
    pub command: String,
    pub risk: CommandRisk,
    pub matched_pattern: Option<String>,
    pub reason: Option<String>,
}

/// One forbidden pattern with the reason it is blocked
#[derive(Debug, Clone)]
pub struct ForbiddenPattern {
    pub pattern: PatternType,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum PatternType {
    Exact(String),
    Contains(String),
    Regex(String),
}

impl ForbiddenPattern {
    pub fn exact(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            pattern: PatternType::Exact(pattern.into()),
            reason: reason.into(),
        }
    }

    pub fn contains(substring: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            pattern: PatternType::Contains(substring.into()),
            reason: reason.into(),
        }
    }

    pub fn regex(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            pattern: PatternType::Regex(pattern.into()),
            reason: reason.into(),
        }
    }

    pub fn matches(&self, command: &str) -> bool {
        match &self.pattern {
            PatternType::Exact(s) => command.trim() == s,
            PatternType::Contains(s) => command.contains(s),
            PatternType::Regex(r) => Regex::new(r)
                .map(|re| re.is_match(command))
                .unwrap_or(false),
        }
    }
}

/// Patterns that are always blocked in safe mode
pub fn forbidden_patterns() -> Vec<ForbiddenPattern> {
    vec![
        // Filesystem destruction
        ForbiddenPattern::exact("rm -rf /", "Root filesystem deletion"),
        ForbiddenPattern::exact("rm -rf /*", "Root filesystem deletion"),
        ForbiddenPattern::regex(r"rm\s+(-[rf]+\s+)+/\s*$", "Root filesystem deletion"),
        ForbiddenPattern::regex(r"rm\s+(-[rf]+\s+)+/\*", "Root filesystem deletion"),
        ForbiddenPattern::contains("mv /* /dev/null", "Root filesystem deletion"),
        // Disk destruction
        ForbiddenPattern::regex(r"dd\s+if=.*of=/dev/[sh]d[a-z]", "Disk overwrite"),
        ForbiddenPattern::regex(r">\s*/dev/[sh]d[a-z]", "Disk overwrite"),
        ForbiddenPattern::regex(r"mkfs(\.|\s)", "Filesystem format"),
        // Redirection into system paths
        ForbiddenPattern::regex(r">\s*/dev/", "Redirection into device files"),
        ForbiddenPattern::regex(r">\s*/proc/", "Redirection into /proc"),
        ForbiddenPattern::regex(r">\s*/sys/", "Redirection into /sys"),
        ForbiddenPattern::regex(r">\s*/etc/", "Redirection into /etc"),
        // Fork bomb
        ForbiddenPattern::regex(r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:", "Fork bomb"),
        ForbiddenPattern::contains(":(){", "Fork bomb"),
        // Privilege escalation
        ForbiddenPattern::regex(r"^\s*sudo\s", "Privilege escalation"),
        ForbiddenPattern::regex(r"^\s*su\s", "Privilege escalation"),
        ForbiddenPattern::regex(r"^\s*pkexec\s", "Privilege escalation"),
        ForbiddenPattern::regex(r"^\s*doas\s", "Privilege escalation"),
        // Piping downloads into a shell
        ForbiddenPattern::regex(r"wget\s+.*\|\s*(sh|bash)", "Piping download into shell"),
        ForbiddenPattern::regex(r"curl\s+.*\|\s*(sh|bash)", "Piping download into shell"),
        // Reverse shells
        ForbiddenPattern::contains("nc -e", "Potential reverse shell"),
        ForbiddenPattern::regex(r"bash\s+-i\s+>&\s*/dev/tcp", "Reverse shell"),
        // System shutdown
        ForbiddenPattern::exact("shutdown", "System shutdown"),
        ForbiddenPattern::exact("reboot", "System reboot"),
        ForbiddenPattern::exact("halt", "System halt"),
        ForbiddenPattern::exact("poweroff", "System poweroff"),
    ]
}

/// Commands with destructive potential (reported, not blocked)
pub fn dangerous_commands() -> Vec<&'static str> {
    vec![
        "rm",
        "rmdir",
        "unlink",
        "mv",
        "chmod",
        "chown",
        "dd",
        "fdisk",
        "mount",
        "umount",
        "git push --force",
        "git reset --hard",
        "git clean -fd",
    ]
}

/// Read-only or informational commands
pub fn safe_commands() -> Vec<&'static str> {
    vec![
        "ls", "pwd", "cd", "cat", "head", "tail", "file", "stat", "wc", "find", "tree", "du",
        "df", "grep", "rg", "sort", "uniq", "cut", "diff", "whoami", "id", "hostname", "uname",
        "date", "uptime", "ps", "env", "printenv", "echo", "printf", "which", "git status",
        "git log", "git diff", "git branch", "git show",
    ]
}

/// Cached analyzer built from the pattern tables above
pub struct CommandAnalyzer {
    forbidden: Vec<ForbiddenPattern>,
    dangerous: Vec<String>,
    safe: Vec<String>,
}

static ANALYZER: OnceLock<CommandAnalyzer> = OnceLock::new();

/// Global analyzer instance
pub fn command_analyzer() -> &'static CommandAnalyzer {
    ANALYZER.get_or_init(CommandAnalyzer::new)
}

impl CommandAnalyzer {
    pub fn new() -> Self {
        Self {
            forbidden: forbidden_patterns(),
            dangerous: dangerous_commands().into_iter().map(String::from).collect(),
            safe: safe_commands().into_iter().map(String::from).collect(),
        }
    }

    /// Classify a command string
    pub fn analyze(&self, command: &str) -> CommandAnalysis {
        let command = command.trim();
        let first_word = first_word(command);

        for pattern in &self.forbidden {
            if pattern.matches(command) {
                return CommandAnalysis {
                    command: command.to_string(),
                    risk: CommandRisk::Forbidden,
                    matched_pattern: Some(format!("{:?}", pattern.pattern)),
                    reason: Some(pattern.reason.clone()),
                };
            }
        }

        for dangerous in &self.dangerous {
            if command.starts_with(dangerous.as_str()) || first_word == dangerous.as_str() {
                return CommandAnalysis {
                    command: command.to_string(),
                    risk: CommandRisk::Dangerous,
                    matched_pattern: Some(dangerous.clone()),
                    reason: Some("Potentially destructive command".to_string()),
                };
            }
        }

        for safe in &self.safe {
            if command.starts_with(safe.as_str()) || first_word == safe.as_str() {
                return CommandAnalysis {
                    command: command.to_string(),
                    risk: CommandRisk::Safe,
                    matched_pattern: Some(safe.clone()),
                    reason: None,
                };
            }
        }

        CommandAnalysis {
            command: command.to_string(),
            risk: CommandRisk::Unknown,
            matched_pattern: None,
            reason: None,
        }
    }

    pub fn is_forbidden(&self, command: &str) -> bool {
        self.forbidden.iter().any(|p| p.matches(command.trim()))
    }
}

impl Default for CommandAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// First shell word of a command, respecting quoting where possible
fn first_word(command: &str) -> String {
    shlex::split(command)
        .and_then(|parts| parts.into_iter().next())
        .unwrap_or_else(|| {
            command
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_string()
        })
}
