//! Model collaborator for OllamaCode
//!
//! The model server is an opaque, potentially slow, potentially failing
//! HTTP dependency. This crate owns the wire format and the `ModelClient`
//! trait the orchestration loop talks through; everything above it treats
//! a model call as "send ordered messages, get one reply text back".

mod error;
mod message;
mod ollama;
mod r#trait;

pub use error::ProviderError;
pub use message::{Message, MessageRole};
pub use ollama::OllamaClient;
pub use r#trait::{ChatOptions, ModelClient};
