//! Ollama (local) client implementation

use crate::error::ProviderError;
use crate::message::{Message, MessageRole};
use crate::r#trait::{ChatOptions, ModelClient};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Local models can be slow to load and generate
const DEFAULT_TIMEOUT_SECS: u64 = 600;
const PING_TIMEOUT_SECS: u64 = 5;

/// HTTP client for a local Ollama server
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a client for the given endpoint, e.g. `http://localhost:11434`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Set a custom request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }

    /// Check whether a model id is present on the server
    ///
    /// If the model list cannot be fetched at all, the model is assumed
    /// valid so an unreachable tags endpoint does not block a working chat
    /// endpoint.
    pub async fn has_model(&self, model: &str) -> bool {
        match self.list_models().await {
            Ok(models) => models.iter().any(|m| m == model),
            Err(_) => true,
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn complete(
        &self,
        messages: Vec<Message>,
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let request = OllamaRequest {
            model: options.model.clone(),
            messages: messages.iter().map(OllamaMessage::from).collect(),
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        tracing::debug!(model = %options.model, messages = messages.len(), "sending chat request");

        let response = self
            .client
            .post(self.chat_url())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                404 => ProviderError::ModelNotFound(format!(
                    "Model '{}' not found. Run 'ollama pull {}' first.",
                    options.model, options.model
                )),
                _ => ProviderError::from_http_status(status, &body),
            });
        }

        let reply: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            prompt_tokens = reply.prompt_eval_count.unwrap_or(0),
            reply_tokens = reply.eval_count.unwrap_or(0),
            "chat request completed"
        );

        Ok(reply.message.content)
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let response = self.client.get(self.tags_url()).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::ServerError(
                "Failed to list models".to_string(),
            ));
        }

        #[derive(Deserialize)]
        struct TagsResponse {
            models: Vec<ModelEntry>,
        }

        #[derive(Deserialize)]
        struct ModelEntry {
            name: String,
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn ping(&self) -> bool {
        self.client
            .get(self.tags_url())
            .timeout(Duration::from_secs(PING_TIMEOUT_SECS))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

// ============================================================================
// Ollama API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        };
        OllamaMessage {
            role: role.to_string(),
            content: msg.content.clone(),
        }
    }
}
