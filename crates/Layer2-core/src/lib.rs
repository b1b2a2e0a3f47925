//! Core runtime for OllamaCode
//!
//! Everything between the model's raw reply text and an executed side
//! effect lives here:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ResponseParser                                             │
//! │  └── raw text → ToolRequests + CodeBlocks (document order)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ToolExecutor                                               │
//! │  ├── registry lookup + schema validation                    │
//! │  ├── SafetyPolicy gate (deny → handler never runs)          │
//! │  └── timed handler invocation + output truncation           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Builtin Tools (Tool trait)                                 │
//! │  └── file_read, file_write, file_list, web_get, sys_info,   │
//! │      python_run, bash                                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod parser;
pub mod tool;

pub use parser::{parse, CodeBlock, ParsedReply, RequestParams, ToolRequest};
pub use tool::{
    PolicyMode, SafetyDecision, SafetyPolicy, Tool, ToolContext, ToolExecutor, ToolOutcome,
    ToolRegistry, ToolResult, ToolResultStatus, ToolSchema,
};
