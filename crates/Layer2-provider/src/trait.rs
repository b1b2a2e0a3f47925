//! Model client interface
//!
//! Implemented by the Ollama client and by scripted mocks in tests. The
//! orchestration loop depends only on this trait, so the model server can
//! be swapped without touching the loop.

use crate::error::ProviderError;
use crate::message::Message;
use async_trait::async_trait;

/// Generation parameters for one completion
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Model identifier
    pub model: String,

    /// Sampling temperature (0.0 - 1.0)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl ChatOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.7,
            max_tokens: 4096,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A model server that completes conversations
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the ordered context and return the single assistant reply text
    async fn complete(
        &self,
        messages: Vec<Message>,
        options: &ChatOptions,
    ) -> Result<String, ProviderError>;

    /// List model identifiers available on the server
    async fn list_models(&self) -> Result<Vec<String>, ProviderError>;

    /// Cheap reachability check
    async fn ping(&self) -> bool;
}
