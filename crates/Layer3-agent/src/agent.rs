//! Per-turn orchestration loop
//!
//! One user turn moves through an explicit state machine:
//!
//! ```text
//! AwaitingModel ──reply──► Parsing ──requests──► ExecutingTools
//!       │                     │                        │
//!       │ failure             │ nothing actionable     │ follow-up found,
//!       ▼                     ▼                        │ depth < max
//!     Done ◄──────────────── Done ◄──────────────────┤
//!                                                      ▼
//!                                              Parsing (depth + 1)
//! ```
//!
//! The model call is the single suspending step; tool executions run
//! strictly sequentially so transcript order is reproducible. The
//! follow-up depth counter travels by value through the phases, which
//! keeps the termination guarantee auditable.

use crate::codestore;
use crate::render;
use crate::transcript::Transcript;
use ollamacode_core::{
    parse, CodeBlock, ParsedReply, PolicyMode, RequestParams, SafetyPolicy, ToolExecutor,
    ToolRegistry, ToolRequest,
};
use ollamacode_foundation::{Result, Settings};
use ollamacode_provider::{ChatOptions, ModelClient};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Progress events emitted while a turn runs
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// Waiting on the model server
    Thinking,

    /// The assistant reply text
    AssistantText(String),

    /// Tool execution started
    ToolStart { name: String },

    /// Tool execution finished
    ToolFinished {
        name: String,
        success: bool,
        preview: String,
    },

    /// A code block was auto-saved
    CodeSaved { path: PathBuf },

    /// Informational notice (depth limit, toggles, ...)
    Notice(String),

    /// Turn-level failure, already recorded in the transcript
    TurnError(String),

    /// The turn reached its terminal state
    Done,
}

/// Follow-up recursion state, passed by value through the turn
#[derive(Debug, Clone, Copy)]
pub struct FollowupState {
    pub depth: u32,
    pub max_depth: u32,
}

impl FollowupState {
    pub fn new(max_depth: u32) -> Self {
        Self {
            depth: 0,
            max_depth,
        }
    }

    /// True when another recursive pass would exceed the limit
    pub fn at_limit(&self) -> bool {
        self.depth >= self.max_depth
    }

    pub fn deeper(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }
}

/// Phases of one turn
enum Phase {
    AwaitingModel,
    Parsing {
        text: String,
        state: FollowupState,
    },
    ExecutingTools {
        requests: Vec<ToolRequest>,
        saves: Vec<CodeBlock>,
        state: FollowupState,
    },
    Done,
}

/// Drives user turns against the model and the tool executor
pub struct Orchestrator {
    client: Arc<dyn ModelClient>,
    registry: Arc<ToolRegistry>,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn ModelClient>, registry: Arc<ToolRegistry>) -> Self {
        Self { client, registry }
    }

    /// Run one user turn to completion
    ///
    /// Every failure mode is recorded in the transcript and the function
    /// returns normally; the REPL decides whether to continue.
    pub async fn run_turn(
        &self,
        transcript: &mut Transcript,
        settings: &Settings,
        user_input: &str,
        events: mpsc::Sender<TurnEvent>,
        cancel: CancellationToken,
    ) -> Result<String> {
        std::fs::create_dir_all(&settings.working_directory)?;

        let mode = if settings.safe_mode {
            PolicyMode::Safe
        } else {
            PolicyMode::Unrestricted
        };
        let executor = ToolExecutor::new(
            Arc::clone(&self.registry),
            SafetyPolicy::new(mode, settings.working_directory.clone()),
        );

        transcript.add_user(user_input);

        let mut assistant_text = String::new();
        let mut phase = Phase::AwaitingModel;

        loop {
            phase = match phase {
                Phase::AwaitingModel => {
                    match self
                        .await_model(transcript, settings, &events, &cancel)
                        .await
                    {
                        ModelStep::Reply(text) => {
                            assistant_text = text.clone();
                            Phase::Parsing {
                                text,
                                state: FollowupState::new(settings.max_followup_depth),
                            }
                        }
                        ModelStep::Failed => Phase::Done,
                    }
                }

                Phase::Parsing { text, state } => {
                    let reply = parse(&text);
                    let (requests, saves) = collect_actions(&reply, settings);
                    debug!(
                        depth = state.depth,
                        requests = requests.len(),
                        saves = saves.len(),
                        "parse pass complete"
                    );
                    if requests.is_empty() && saves.is_empty() {
                        Phase::Done
                    } else {
                        Phase::ExecutingTools {
                            requests,
                            saves,
                            state,
                        }
                    }
                }

                Phase::ExecutingTools {
                    requests,
                    saves,
                    state,
                } => {
                    match self
                        .execute_all(&executor, transcript, settings, requests, saves, state, &events, &cancel)
                        .await
                    {
                        ExecStep::Followup { text, state } => Phase::Parsing { text, state },
                        ExecStep::Finished | ExecStep::Interrupted => Phase::Done,
                    }
                }

                Phase::Done => break,
            };
        }

        if let Err(e) = transcript.save(&settings.history_file) {
            warn!(error = %e, "failed to persist transcript");
        }

        let _ = events.send(TurnEvent::Done).await;
        Ok(assistant_text)
    }

    /// The single suspending step of the loop
    async fn await_model(
        &self,
        transcript: &mut Transcript,
        settings: &Settings,
        events: &mpsc::Sender<TurnEvent>,
        cancel: &CancellationToken,
    ) -> ModelStep {
        let _ = events.send(TurnEvent::Thinking).await;

        transcript.trim_to(settings.context_window);
        let messages = transcript.to_messages(settings.system_prompt.as_deref());
        let options = ChatOptions::new(&settings.model)
            .temperature(settings.temperature)
            .max_tokens(settings.max_tokens);

        let reply = tokio::select! {
            _ = cancel.cancelled() => {
                let text = render::error_turn("interrupted", "model call cancelled");
                transcript.add_tool_result(&text);
                let _ = events.send(TurnEvent::TurnError(text)).await;
                return ModelStep::Failed;
            }
            reply = self.client.complete(messages, &options) => reply,
        };

        match reply {
            Ok(text) => {
                transcript.add_assistant(&text);
                let _ = events.send(TurnEvent::AssistantText(text.clone())).await;
                ModelStep::Reply(text)
            }
            Err(e) => {
                warn!(error = %e, "model call failed");
                let text = render::error_turn("model call failed", &e.to_string());
                transcript.add_tool_result(&text);
                let _ = events.send(TurnEvent::TurnError(text)).await;
                ModelStep::Failed
            }
        }
    }

    /// Execute requests sequentially in parse order, then handle auto-save
    /// and the follow-up decision
    #[allow(clippy::too_many_arguments)]
    async fn execute_all(
        &self,
        executor: &ToolExecutor,
        transcript: &mut Transcript,
        settings: &Settings,
        requests: Vec<ToolRequest>,
        saves: Vec<CodeBlock>,
        state: FollowupState,
        events: &mpsc::Sender<TurnEvent>,
        cancel: &CancellationToken,
    ) -> ExecStep {
        let mut followup_texts: Vec<String> = Vec::new();

        for request in &requests {
            info!(tool = %request.name, depth = state.depth, "executing tool");
            let _ = events
                .send(TurnEvent::ToolStart {
                    name: request.name.clone(),
                })
                .await;

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    let text = render::error_turn("interrupted", "tool execution cancelled");
                    transcript.add_tool_result(&text);
                    let _ = events.send(TurnEvent::TurnError(text)).await;
                    return ExecStep::Interrupted;
                }
                result = executor.execute(request) => result,
            };

            transcript.add_tool_result(render::tool_result_turn(&result));
            let _ = events
                .send(TurnEvent::ToolFinished {
                    name: result.tool.clone(),
                    success: result.is_ok(),
                    preview: preview(&result.output, result.detail.as_deref()),
                })
                .await;

            // a successful result whose own text contains further markers
            // is a follow-up candidate
            if settings.process_followup_commands && result.is_ok() {
                let nested = parse(&result.output);
                let (nested_requests, _) = collect_actions(&nested, settings);
                if !nested_requests.is_empty() {
                    followup_texts.push(result.output.clone());
                }
            }
        }

        for block in &saves {
            match codestore::save_block(block, &settings.code_dir()) {
                Ok(path) => {
                    transcript.add_tool_result(render::code_saved_turn(&block.lang, &path));
                    let _ = events.send(TurnEvent::CodeSaved { path }).await;
                }
                Err(e) => {
                    transcript.add_tool_result(render::error_turn("auto-save failed", &e.to_string()));
                }
            }
        }

        if followup_texts.is_empty() {
            return ExecStep::Finished;
        }

        if state.at_limit() {
            info!(max_depth = state.max_depth, "follow-up depth limit reached");
            transcript.add_tool_result(render::DEPTH_LIMIT_NOTICE);
            let _ = events
                .send(TurnEvent::Notice(render::DEPTH_LIMIT_NOTICE.to_string()))
                .await;
            return ExecStep::Finished;
        }

        ExecStep::Followup {
            text: followup_texts.join("\n\n"),
            state: state.deeper(),
        }
    }
}

enum ModelStep {
    Reply(String),
    Failed,
}

enum ExecStep {
    Followup { text: String, state: FollowupState },
    Finished,
    Interrupted,
}

/// Turn a parse result into executable requests and saveable blocks
///
/// Ordering is document order across explicit markers and promoted bash
/// blocks; execution order is observable, so it must be deterministic.
fn collect_actions(
    reply: &ParsedReply,
    settings: &Settings,
) -> (Vec<ToolRequest>, Vec<CodeBlock>) {
    let mut requests: Vec<ToolRequest> = Vec::new();

    if settings.enable_tools {
        requests.extend(reply.requests.iter().cloned());
    }

    if settings.enable_bash {
        for block in reply.blocks.iter().filter(|b| b.is_bash()) {
            let mut params = serde_json::Map::new();
            params.insert(
                "command".to_string(),
                serde_json::Value::String(block.source.clone()),
            );
            requests.push(ToolRequest {
                name: "bash".to_string(),
                params: RequestParams::Json(params),
                span: block.span.clone(),
            });
        }
    }

    requests.sort_by_key(|r| r.span.start);

    // python blocks run implicitly only when they are the only actionable
    // content - an explicit marker or bash block takes precedence
    if settings.auto_run_python && requests.is_empty() {
        for block in reply.blocks.iter().filter(|b| b.is_python()) {
            let mut params = serde_json::Map::new();
            params.insert(
                "code".to_string(),
                serde_json::Value::String(block.source.clone()),
            );
            requests.push(ToolRequest {
                name: "python_run".to_string(),
                params: RequestParams::Json(params),
                span: block.span.clone(),
            });
        }
    }

    let saves: Vec<CodeBlock> = if settings.auto_save_code {
        reply
            .blocks
            .iter()
            .filter(|b| !b.is_bash())
            .cloned()
            .collect()
    } else {
        Vec::new()
    };

    (requests, saves)
}

/// Single-line preview for progress events
fn preview(output: &str, detail: Option<&str>) -> String {
    let text = detail.unwrap_or(output);
    let flat = text.replace('\n', " ");
    if flat.len() <= 100 {
        flat
    } else {
        let mut cut = 100;
        while cut > 0 && !flat.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &flat[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TurnRole;
    use async_trait::async_trait;
    use ollamacode_provider::{Message, ProviderError};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Model collaborator that replays scripted replies
    struct ScriptedClient {
        replies: Mutex<VecDeque<std::result::Result<String, ProviderError>>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<std::result::Result<String, ProviderError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
            }
        }

        fn reply(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        async fn complete(
            &self,
            _messages: Vec<Message>,
            _options: &ChatOptions,
        ) -> std::result::Result<String, ProviderError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::ServerError("script exhausted".into())))
        }

        async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
            Ok(vec![])
        }

        async fn ping(&self) -> bool {
            true
        }
    }

    fn settings(dir: &TempDir) -> Settings {
        Settings {
            working_directory: dir.path().to_path_buf(),
            history_file: dir.path().join("history.json"),
            ..Settings::default()
        }
    }

    async fn run(client: ScriptedClient, settings: &Settings) -> (Transcript, String) {
        let orchestrator = Orchestrator::new(
            Arc::new(client),
            Arc::new(ToolRegistry::with_builtins()),
        );
        let mut transcript = Transcript::new();
        let (tx, mut rx) = mpsc::channel(256);
        tokio::spawn(async move { while rx.recv().await.is_some() {} });

        let text = orchestrator
            .run_turn(
                &mut transcript,
                settings,
                "do the thing",
                tx,
                CancellationToken::new(),
            )
            .await
            .unwrap();
        (transcript, text)
    }

    fn tool_turns(transcript: &Transcript) -> Vec<&str> {
        transcript
            .turns()
            .iter()
            .filter(|t| t.role == TurnRole::ToolResult)
            .map(|t| t.content.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_plain_reply_has_no_tool_turns() {
        let dir = TempDir::new().unwrap();
        let (transcript, text) =
            run(ScriptedClient::reply("Just an answer."), &settings(&dir)).await;

        assert_eq!(text, "Just an answer.");
        assert_eq!(transcript.len(), 2); // user + assistant
    }

    #[tokio::test]
    async fn test_scenario_a_destructive_bash_denied() {
        let dir = TempDir::new().unwrap();
        let reply = "Sure:\n```bash\nrm -rf /\n```";
        let (transcript, _) = run(ScriptedClient::reply(reply), &settings(&dir)).await;

        let turns = tool_turns(&transcript);
        assert_eq!(turns.len(), 1);
        assert!(turns[0].contains("Execution failed"));
        assert!(turns[0].contains("not allowed"));
    }

    #[tokio::test]
    async fn test_bash_block_executed_in_order() {
        let dir = TempDir::new().unwrap();
        let reply = "```bash\necho first\n```\nthen\n```bash\necho second\n```";
        let (transcript, _) = run(ScriptedClient::reply(reply), &settings(&dir)).await;

        let turns = tool_turns(&transcript);
        assert_eq!(turns.len(), 2);
        assert!(turns[0].contains("first"));
        assert!(turns[1].contains("second"));
    }

    #[tokio::test]
    async fn test_bash_disabled_means_no_execution() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(&dir);
        settings.enable_bash = false;
        let reply = "```bash\necho hi\n```";
        let (transcript, _) = run(ScriptedClient::reply(reply), &settings).await;

        assert!(tool_turns(&transcript).is_empty());
    }

    #[tokio::test]
    async fn test_scenario_c_python_block_auto_run() {
        if std::process::Command::new("python3")
            .arg("--version")
            .output()
            .is_err()
        {
            return; // no interpreter on this machine
        }

        let dir = TempDir::new().unwrap();
        let mut settings = settings(&dir);
        settings.auto_run_python = true;
        let reply = "```python\nprint(21 * 2)\n```";
        let (transcript, _) = run(ScriptedClient::reply(reply), &settings).await;

        let turns = tool_turns(&transcript);
        assert_eq!(turns.len(), 1);
        assert!(turns[0].contains("`python_run`"));
        assert!(turns[0].contains("42"));
    }

    #[tokio::test]
    async fn test_python_not_promoted_next_to_explicit_marker() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(&dir);
        settings.auto_run_python = true;
        let reply = concat!(
            "```tool\n{\"tool\": \"sys_info\", \"params\": {}}\n```\n",
            "```python\nprint('skipped')\n```\n",
        );
        let (transcript, _) = run(ScriptedClient::reply(reply), &settings).await;

        let turns = tool_turns(&transcript);
        assert_eq!(turns.len(), 1);
        assert!(turns[0].contains("`sys_info`"));
    }

    #[tokio::test]
    async fn test_explicit_marker_executes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("data.txt"), "payload here").unwrap();
        let reply = "```tool\n{\"tool\": \"file_read\", \"params\": {\"path\": \"data.txt\"}}\n```";
        let (transcript, _) = run(ScriptedClient::reply(reply), &settings(&dir)).await;

        let turns = tool_turns(&transcript);
        assert_eq!(turns.len(), 1);
        assert!(turns[0].contains("payload here"));
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_not_crashing() {
        let dir = TempDir::new().unwrap();
        let reply = "```tool\n{\"tool\": \"file_delete\", \"params\": {\"path\": \"x\"}}\n```";
        let (transcript, _) = run(ScriptedClient::reply(reply), &settings(&dir)).await;

        let turns = tool_turns(&transcript);
        assert_eq!(turns.len(), 1);
        assert!(turns[0].contains("unknown tool"));
    }

    #[tokio::test]
    async fn test_scenario_d_depth_zero_stops_with_notice() {
        let dir = TempDir::new().unwrap();
        // a file whose content is itself a tool marker
        std::fs::write(
            dir.path().join("trigger.txt"),
            "```tool\n{\"tool\": \"sys_info\", \"params\": {}}\n```",
        )
        .unwrap();

        let mut settings = settings(&dir);
        settings.process_followup_commands = true;
        settings.max_followup_depth = 0;

        let reply =
            "```tool\n{\"tool\": \"file_read\", \"params\": {\"path\": \"trigger.txt\"}}\n```";
        let (transcript, _) = run(ScriptedClient::reply(reply), &settings).await;

        let turns = tool_turns(&transcript);
        // file_read result + depth notice, nested request never executed
        assert_eq!(turns.len(), 2);
        assert!(turns[0].contains("`file_read`"));
        assert!(turns[1].contains("depth limit"));
        assert!(!turns.iter().any(|t| t.contains("`sys_info`")));
    }

    #[tokio::test]
    async fn test_followup_depth_one_executes_nested() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("trigger.txt"),
            "```tool\n{\"tool\": \"sys_info\", \"params\": {}}\n```",
        )
        .unwrap();

        let mut settings = settings(&dir);
        settings.process_followup_commands = true;
        settings.max_followup_depth = 1;

        let reply =
            "```tool\n{\"tool\": \"file_read\", \"params\": {\"path\": \"trigger.txt\"}}\n```";
        let (transcript, _) = run(ScriptedClient::reply(reply), &settings).await;

        let turns = tool_turns(&transcript);
        assert!(turns.iter().any(|t| t.contains("`sys_info`")));
        assert!(!turns.iter().any(|t| t.contains("depth limit")));
    }

    #[tokio::test]
    async fn test_followup_disabled_ignores_nested_markers() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("trigger.txt"),
            "```tool\n{\"tool\": \"sys_info\", \"params\": {}}\n```",
        )
        .unwrap();

        let settings = settings(&dir); // process_followup_commands off by default
        let reply =
            "```tool\n{\"tool\": \"file_read\", \"params\": {\"path\": \"trigger.txt\"}}\n```";
        let (transcript, _) = run(ScriptedClient::reply(reply), &settings).await;

        let turns = tool_turns(&transcript);
        assert_eq!(turns.len(), 1);
        assert!(!turns.iter().any(|t| t.contains("depth limit")));
    }

    #[tokio::test]
    async fn test_model_failure_becomes_turn_error() {
        let dir = TempDir::new().unwrap();
        let client =
            ScriptedClient::new(vec![Err(ProviderError::Network("connection refused".into()))]);
        let (transcript, text) = run(client, &settings(&dir)).await;

        assert!(text.is_empty());
        let turns = tool_turns(&transcript);
        assert_eq!(turns.len(), 1);
        assert!(turns[0].contains("connection refused"));
    }

    #[tokio::test]
    async fn test_auto_save_writes_block() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(&dir);
        settings.auto_save_code = true;
        settings.code_directory = "generated".to_string();

        let reply = "```python\n# greeter\nprint('hi')\n```";
        let (transcript, _) = run(ScriptedClient::reply(reply), &settings).await;

        let saved = dir.path().join("generated/greeter.py");
        assert!(saved.exists());
        assert!(tool_turns(&transcript)
            .iter()
            .any(|t| t.contains("Saved python block")));
    }

    #[tokio::test]
    async fn test_unparseable_marker_reported() {
        let dir = TempDir::new().unwrap();
        let reply = "```tool\n{\"tool\": \"bash\", \"params\": {oops\n```";
        let (transcript, _) = run(ScriptedClient::reply(reply), &settings(&dir)).await;

        let turns = tool_turns(&transcript);
        assert_eq!(turns.len(), 1);
        assert!(turns[0].contains("unparseable parameters"));
    }

    #[test]
    fn test_followup_state_limits() {
        let state = FollowupState::new(2);
        assert!(!state.at_limit());
        let state = state.deeper().deeper();
        assert!(state.at_limit());

        assert!(FollowupState::new(0).at_limit());
    }
}
