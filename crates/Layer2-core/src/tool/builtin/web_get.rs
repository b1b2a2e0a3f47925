//! web_get - outbound HTTP GET

use crate::tool::{
    ParamKind, SafetyDecision, SafetyPolicy, Tool, ToolContext, ToolOutcome, ToolSchema,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub struct WebGetTool {
    client: Client,
}

impl WebGetTool {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(Self::REQUEST_TIMEOUT_SECS))
                .user_agent("OllamaCode/0.1")
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    pub const NAME: &'static str = "web_get";

    const REQUEST_TIMEOUT_SECS: u64 = 10;

    /// Bound on the body kept for the model context
    const MAX_BODY_CHARS: usize = 50_000;
}

impl Default for WebGetTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebGetTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Make an HTTP GET request and return status and body"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().required("url", ParamKind::String, "URL to fetch (http/https)")
    }

    fn timeout(&self) -> Duration {
        // outer bound; the request itself times out first
        Duration::from_secs(Self::REQUEST_TIMEOUT_SECS + 5)
    }

    fn safety_check(
        &self,
        params: &serde_json::Map<String, Value>,
        policy: &SafetyPolicy,
    ) -> SafetyDecision {
        let url = params.get("url").and_then(|v| v.as_str()).unwrap_or("");
        policy.evaluate_url(url)
    }

    async fn execute(
        &self,
        params: &serde_json::Map<String, Value>,
        _ctx: &ToolContext,
    ) -> ToolOutcome {
        let url = params.get("url").and_then(|v| v.as_str()).unwrap_or("");

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return ToolOutcome::error("URL must start with http:// or https://");
        }

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return ToolOutcome::error(format!(
                    "Request timed out after {}s: {}",
                    Self::REQUEST_TIMEOUT_SECS,
                    url
                ));
            }
            Err(e) => return ToolOutcome::error(format!("Request failed: {}", e)),
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/plain")
            .to_string();

        let is_text = content_type.contains("text")
            || content_type.contains("json")
            || content_type.contains("xml");

        let body = if is_text {
            match response.text().await {
                Ok(mut text) => {
                    if text.len() > Self::MAX_BODY_CHARS {
                        let mut cut = Self::MAX_BODY_CHARS;
                        while cut > 0 && !text.is_char_boundary(cut) {
                            cut -= 1;
                        }
                        text.truncate(cut);
                        text.push_str("... (content truncated)");
                    }
                    text
                }
                Err(e) => return ToolOutcome::error(format!("Failed to read body: {}", e)),
            }
        } else {
            match response.bytes().await {
                Ok(bytes) => format!(
                    "[Binary data, {} bytes, Content-Type: {}]",
                    bytes.len(),
                    content_type
                ),
                Err(e) => return ToolOutcome::error(format!("Failed to read body: {}", e)),
            }
        };

        ToolOutcome::success(format!(
            "URL: {}\nStatus: {}\nContent-Type: {}\n\n{}",
            url, status, content_type, body
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::PolicyMode;
    use serde_json::json;

    fn params(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_safety_check_blocks_private() {
        let policy = SafetyPolicy::new(PolicyMode::Safe, "/tmp/ws");
        let decision = WebGetTool::new()
            .safety_check(&params(json!({"url": "http://192.168.0.1/"})), &policy);
        assert!(!decision.is_allowed());
    }

    #[tokio::test]
    async fn test_bad_scheme_rejected() {
        let ctx = ToolContext::new(SafetyPolicy::new(PolicyMode::Unrestricted, "/tmp/ws"));
        let outcome = WebGetTool::new()
            .execute(&params(json!({"url": "ftp://example.com"})), &ctx)
            .await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("http"));
    }
}
