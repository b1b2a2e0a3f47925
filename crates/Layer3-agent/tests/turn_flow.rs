//! End-to-end turn flow against a scripted model collaborator

use async_trait::async_trait;
use ollamacode_agent::{Orchestrator, Transcript, TurnRole};
use ollamacode_core::ToolRegistry;
use ollamacode_foundation::Settings;
use ollamacode_provider::{ChatOptions, Message, ModelClient, ProviderError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct ScriptedClient {
    replies: Mutex<VecDeque<String>>,
    /// Context captured from each complete() call
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedClient {
    fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(String::from).collect()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn complete(
        &self,
        messages: Vec<Message>,
        _options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        self.seen.lock().unwrap().push(messages);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::ServerError("script exhausted".into()))
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(vec![])
    }

    async fn ping(&self) -> bool {
        true
    }
}

fn test_settings(dir: &TempDir) -> Settings {
    Settings {
        working_directory: dir.path().to_path_buf(),
        history_file: dir.path().join("history.json"),
        ..Settings::default()
    }
}

async fn run_one_turn(
    client: Arc<ScriptedClient>,
    settings: &Settings,
    input: &str,
) -> Transcript {
    let orchestrator = Orchestrator::new(client, Arc::new(ToolRegistry::with_builtins()));
    let mut transcript = Transcript::new();
    let (tx, mut rx) = mpsc::channel(256);
    tokio::spawn(async move { while rx.recv().await.is_some() {} });

    orchestrator
        .run_turn(
            &mut transcript,
            settings,
            input,
            tx,
            CancellationToken::new(),
        )
        .await
        .expect("turn should not fail");
    transcript
}

#[tokio::test]
async fn mixed_reply_executes_in_document_order() {
    let dir = TempDir::new().unwrap();
    let reply = concat!(
        "I'll create the file, then inspect the directory.\n",
        "```tool\n",
        "{\"tool\": \"file_write\", \"params\": {\"path\": \"notes.txt\", \"content\": \"remember this\"}}\n",
        "```\n",
        "```bash\nls\n```\n",
    );
    let client = Arc::new(ScriptedClient::new(vec![reply]));

    let transcript = run_one_turn(client, &test_settings(&dir), "make a note").await;

    // side effect landed
    assert_eq!(
        std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
        "remember this"
    );

    let tool_turns: Vec<_> = transcript
        .turns()
        .iter()
        .filter(|t| t.role == TurnRole::ToolResult)
        .collect();
    assert_eq!(tool_turns.len(), 2);
    assert!(tool_turns[0].content.contains("`file_write`"));
    assert!(tool_turns[1].content.contains("`bash`"));
    // the write happened before the ls, so ls sees the file
    assert!(tool_turns[1].content.contains("notes.txt"));
}

#[tokio::test]
async fn next_turn_context_includes_tool_results() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new(vec![
        "```bash\necho marker-output\n```",
        "Understood.",
    ]));

    let settings = test_settings(&dir);
    let orchestrator = Orchestrator::new(
        Arc::clone(&client) as Arc<dyn ModelClient>,
        Arc::new(ToolRegistry::with_builtins()),
    );
    let mut transcript = Transcript::new();

    for input in ["run it", "what did it say?"] {
        let (tx, mut rx) = mpsc::channel(256);
        tokio::spawn(async move { while rx.recv().await.is_some() {} });
        orchestrator
            .run_turn(
                &mut transcript,
                &settings,
                input,
                tx,
                CancellationToken::new(),
            )
            .await
            .unwrap();
    }

    // the second model call must see the first turn's tool result
    let seen = client.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    let second_context = &seen[1];
    assert!(second_context
        .iter()
        .any(|m| m.content.contains("marker-output")));
}

#[tokio::test]
async fn followup_chain_stops_at_configured_depth() {
    let dir = TempDir::new().unwrap();

    // a.txt asks for b.txt, b.txt asks for c.txt; with max depth 1 the
    // chain must stop after b.txt is read
    std::fs::write(
        dir.path().join("a.txt"),
        "```tool\n{\"tool\": \"file_read\", \"params\": {\"path\": \"b.txt\"}}\n```",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("b.txt"),
        "```tool\n{\"tool\": \"file_read\", \"params\": {\"path\": \"c.txt\"}}\n```",
    )
    .unwrap();
    std::fs::write(dir.path().join("c.txt"), "the end").unwrap();

    let mut settings = test_settings(&dir);
    settings.process_followup_commands = true;
    settings.max_followup_depth = 1;

    let reply = "```tool\n{\"tool\": \"file_read\", \"params\": {\"path\": \"a.txt\"}}\n```";
    let client = Arc::new(ScriptedClient::new(vec![reply]));
    let transcript = run_one_turn(client, &settings, "chase the chain").await;

    let contents: Vec<_> = transcript
        .turns()
        .iter()
        .filter(|t| t.role == TurnRole::ToolResult)
        .map(|t| t.content.as_str())
        .collect();

    // a.txt read at depth 0, b.txt read at depth 1, then the limit notice;
    // c.txt is never read
    assert!(contents.iter().any(|c| c.contains("b.txt")));
    assert!(contents.iter().any(|c| c.contains("depth limit")));
    assert!(!contents.iter().any(|c| c.contains("the end")));
}

#[tokio::test]
async fn model_error_surfaces_and_session_continues() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new(vec![])); // immediately exhausted

    let settings = test_settings(&dir);
    let orchestrator = Orchestrator::new(
        Arc::clone(&client) as Arc<dyn ModelClient>,
        Arc::new(ToolRegistry::with_builtins()),
    );
    let mut transcript = Transcript::new();

    let (tx, mut rx) = mpsc::channel(256);
    tokio::spawn(async move { while rx.recv().await.is_some() {} });
    let result = orchestrator
        .run_turn(
            &mut transcript,
            &settings,
            "hello?",
            tx,
            CancellationToken::new(),
        )
        .await;

    assert!(result.is_ok());
    assert!(transcript
        .turns()
        .iter()
        .any(|t| t.role == TurnRole::ToolResult && t.content.contains("[error]")));
}
