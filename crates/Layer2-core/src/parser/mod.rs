//! Response parser
//!
//! Extracts structured tool requests and fenced code blocks from raw model
//! text. The model emits tool calls as ```` ```tool ```` fenced JSON:
//!
//! ````text
//! ```tool
//! {"tool": "file_read", "params": {"path": "src/main.rs"}}
//! ```
//! ````
//!
//! The parser is a single forward pass and never fails: malformed payloads
//! become requests with `Unparseable` parameters that the executor reports
//! as errors, and an opening fence with no closing fence yields nothing.

use regex::Regex;
use serde_json::Value;
use std::ops::Range;
use std::sync::OnceLock;

/// Parameters of a tool request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestParams {
    /// Decoded key-value payload
    Json(serde_json::Map<String, Value>),

    /// Payload that could not be decoded; carries the raw text
    Unparseable(String),
}

impl RequestParams {
    pub fn as_json(&self) -> Option<&serde_json::Map<String, Value>> {
        match self {
            RequestParams::Json(map) => Some(map),
            RequestParams::Unparseable(_) => None,
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    /// Requested tool name (may be empty if it could not be salvaged)
    pub name: String,

    /// Decoded parameters or the unparseable marker
    pub params: RequestParams,

    /// Byte range of the fence in the source text
    pub span: Range<usize>,
}

impl ToolRequest {
    /// Build a request directly (used when promoting code blocks)
    pub fn synthesized(name: impl Into<String>, params: serde_json::Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            params: RequestParams::Json(params),
            span: 0..0,
        }
    }
}

/// A fenced code block with an optional language tag
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    /// Language tag, lowercased; empty when the fence had none
    pub lang: String,

    /// Block body with the fence lines stripped
    pub source: String,

    /// Byte range of the fence in the source text
    pub span: Range<usize>,
}

impl CodeBlock {
    pub fn is_bash(&self) -> bool {
        matches!(self.lang.as_str(), "bash" | "sh" | "shell")
    }

    pub fn is_python(&self) -> bool {
        matches!(self.lang.as_str(), "python" | "py")
    }
}

/// Parse result: requests and blocks, each in document order
#[derive(Debug, Clone, Default)]
pub struct ParsedReply {
    pub requests: Vec<ToolRequest>,
    pub blocks: Vec<CodeBlock>,
}

impl ParsedReply {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.blocks.is_empty()
    }

    /// True if the text contains anything the loop might act on
    pub fn has_actionable(&self) -> bool {
        !self.is_empty()
    }
}

static FENCE_RE: OnceLock<Regex> = OnceLock::new();
static SALVAGE_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn fence_re() -> &'static Regex {
    // non-greedy body; a fence without a closing ``` simply never matches
    FENCE_RE.get_or_init(|| {
        Regex::new(r"(?s)```([A-Za-z0-9_+.-]*)[ \t]*\r?\n(.*?)```").expect("fence regex")
    })
}

fn salvage_name_re() -> &'static Regex {
    SALVAGE_NAME_RE
        .get_or_init(|| Regex::new(r#""tool"\s*:\s*"([^"]+)""#).expect("salvage regex"))
}

/// Parse raw model text into tool requests and code blocks
pub fn parse(text: &str) -> ParsedReply {
    let mut reply = ParsedReply::default();

    for caps in fence_re().captures_iter(text) {
        let whole = caps.get(0).expect("match");
        let lang = caps
            .get(1)
            .map(|m| m.as_str().trim().to_lowercase())
            .unwrap_or_default();
        let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let span = whole.start()..whole.end();

        if lang == "tool" {
            reply.requests.push(decode_tool_marker(body, span));
        } else {
            reply.blocks.push(CodeBlock {
                lang,
                source: body.trim().to_string(),
                span,
            });
        }
    }

    reply
}

/// Decode one ```tool payload, tolerating formatting drift
fn decode_tool_marker(body: &str, span: Range<usize>) -> ToolRequest {
    let trimmed = body.trim();

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(obj)) => {
            let name = obj
                .get("tool")
                .and_then(|v| v.as_str())
                .map(clean_tool_name)
                .unwrap_or_default();

            match (name.is_empty(), obj.get("params")) {
                (false, Some(Value::Object(params))) => ToolRequest {
                    name,
                    params: RequestParams::Json(params.clone()),
                    span,
                },
                // a marker with a name but no params is a valid no-arg call
                (false, None) => ToolRequest {
                    name,
                    params: RequestParams::Json(serde_json::Map::new()),
                    span,
                },
                _ => ToolRequest {
                    name,
                    params: RequestParams::Unparseable(trimmed.to_string()),
                    span,
                },
            }
        }
        _ => {
            // salvage the name when the payload is broken JSON
            let name = salvage_name_re()
                .captures(trimmed)
                .and_then(|c| c.get(1))
                .map(|m| clean_tool_name(m.as_str()))
                .unwrap_or_default();

            ToolRequest {
                name,
                params: RequestParams::Unparseable(trimmed.to_string()),
                span,
            }
        }
    }
}

/// Strip whitespace and trailing punctuation the model sometimes appends
fn clean_tool_name(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(['.', ',', ':', ';', '!'])
        .to_string()
}
