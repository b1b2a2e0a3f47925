//! Conversation transcript
//!
//! Append-only within a session and owned exclusively by the orchestration
//! loop; the CLI clears it only through an explicit reset. The transcript
//! is the context sent to the model, so it is trimmed against a character
//! budget before each call.

use chrono::{DateTime, Local};
use ollamacode_provider::Message;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Role of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnRole {
    User,
    Assistant,
    ToolResult,
}

/// One entry in the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl Turn {
    fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Local::now(),
        }
    }
}

/// Ordered record of user, assistant, and tool-result turns
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::new(TurnRole::User, content));
    }

    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::new(TurnRole::Assistant, content));
    }

    pub fn add_tool_result(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::new(TurnRole::ToolResult, content));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Explicit reset, reachable only from the CLI
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Total content size in characters
    pub fn char_count(&self) -> usize {
        self.turns.iter().map(|t| t.content.len()).sum()
    }

    /// Drop oldest turns until the content fits the budget. The newest
    /// turn is never dropped even if it alone exceeds the budget.
    pub fn trim_to(&mut self, budget: usize) {
        while self.turns.len() > 1 && self.char_count() > budget {
            let removed = self.turns.remove(0);
            tracing::debug!(role = ?removed.role, chars = removed.content.len(), "trimmed turn");
        }
    }

    /// Build the ordered context for a model call
    pub fn to_messages(&self, system_prompt: Option<&str>) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.turns.len() + 1);
        if let Some(prompt) = system_prompt {
            messages.push(Message::system(prompt));
        }
        for turn in &self.turns {
            messages.push(match turn.role {
                TurnRole::User => Message::user(&turn.content),
                TurnRole::Assistant => Message::assistant(&turn.content),
                TurnRole::ToolResult => Message::tool(&turn.content),
            });
        }
        messages
    }

    /// Best-effort persistence; the session continues if this fails
    pub fn save(&self, path: &Path) -> ollamacode_foundation::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredTranscript {
            saved_at: Local::now(),
            turns: self.turns.clone(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> ollamacode_foundation::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let stored: StoredTranscript = serde_json::from_str(&text)?;
        Ok(Self {
            turns: stored.turns,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct StoredTranscript {
    saved_at: DateTime<Local>,
    turns: Vec<Turn>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ollamacode_provider::MessageRole;

    #[test]
    fn test_append_order() {
        let mut transcript = Transcript::new();
        transcript.add_user("question");
        transcript.add_assistant("answer");
        transcript.add_tool_result("tool output");

        let roles: Vec<_> = transcript.turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![TurnRole::User, TurnRole::Assistant, TurnRole::ToolResult]
        );
    }

    #[test]
    fn test_role_serialization_tags() {
        let turn = Turn::new(TurnRole::ToolResult, "x");
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains(r#""role":"tool-result""#));
    }

    #[test]
    fn test_to_messages_with_system() {
        let mut transcript = Transcript::new();
        transcript.add_user("hi");
        transcript.add_tool_result("ran");

        let messages = transcript.to_messages(Some("be helpful"));
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[2].role, MessageRole::Tool);
    }

    #[test]
    fn test_trim_drops_oldest_first() {
        let mut transcript = Transcript::new();
        transcript.add_user("a".repeat(100));
        transcript.add_assistant("b".repeat(100));
        transcript.add_user("c".repeat(100));

        transcript.trim_to(250);
        assert_eq!(transcript.len(), 2);
        assert!(transcript.turns()[0].content.starts_with('b'));
    }

    #[test]
    fn test_trim_keeps_newest_turn() {
        let mut transcript = Transcript::new();
        transcript.add_user("x".repeat(500));
        transcript.trim_to(10);
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("history.json");

        let mut transcript = Transcript::new();
        transcript.add_user("persist me");
        transcript.add_assistant("ok");
        transcript.save(&path).unwrap();

        let loaded = Transcript::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.turns()[0].content, "persist me");
    }
}
