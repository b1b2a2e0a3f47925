//! Security primitives
//!
//! String-pattern command screening and path/URL validation used by the
//! safety policy one layer up. The command screen is a best-effort
//! deterrent against obviously destructive shell input, not a security
//! boundary: it matches substrings and regexes, it does not parse shell
//! syntax. It is deliberately conservative and will sometimes deny a
//! harmless command.

mod command;
mod path;
mod url;

pub use command::{
    command_analyzer, dangerous_commands, forbidden_patterns, safe_commands, CommandAnalysis,
    CommandAnalyzer, CommandRisk, ForbiddenPattern, PatternType,
};
pub use path::{is_sensitive_path, normalize_path, PathValidation, PathValidator};
pub use url::{validate_url, UrlValidation};
