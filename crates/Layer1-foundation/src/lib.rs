//! Foundation layer for OllamaCode
//!
//! The bottom of the workspace: error types, the configuration snapshot,
//! and the security primitives shared by every layer above.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Layer4-CLI                                                 │
//! │  └── REPL, slash commands, argument parsing                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layer3-Agent                                               │
//! │  └── transcript + per-turn orchestration loop               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layer2-Core / Layer2-Provider                              │
//! │  ├── response parser, tool registry, executor               │
//! │  └── Ollama HTTP client                                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layer1-Foundation (this crate)                             │
//! │  ├── Error / Result                                         │
//! │  ├── Settings (immutable per-turn snapshot)                 │
//! │  └── Security (command risk, path + URL validation)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod security;

pub use config::Settings;
pub use error::{Error, Result};
pub use security::{
    command_analyzer, CommandAnalysis, CommandAnalyzer, CommandRisk, PathValidation,
    PathValidator,
};
