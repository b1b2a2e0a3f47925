//! Orchestration layer for OllamaCode
//!
//! Owns the conversation transcript and drives one user turn at a time
//! through an explicit state machine: send context to the model, parse the
//! reply, execute requested tools sequentially, and re-parse tool result
//! text up to a configured follow-up depth.

mod agent;
mod codestore;
mod render;
mod transcript;

pub use agent::{FollowupState, Orchestrator, TurnEvent};
pub use codestore::{filename_for, save_block};
pub use transcript::{Transcript, Turn, TurnRole};
