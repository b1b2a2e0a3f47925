//! Interactive REPL
//!
//! Thin shell over the orchestrator: reads a line, dispatches slash
//! commands, and forwards everything else as a user turn. Ctrl-C cancels
//! the in-flight turn without leaving the prompt.

use crossterm::style::Stylize;
use ollamacode_agent::{Orchestrator, Transcript, TurnEvent};
use ollamacode_core::ToolRegistry;
use ollamacode_foundation::Settings;
use ollamacode_provider::OllamaClient;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct Repl {
    pub(crate) client: Arc<OllamaClient>,
    pub(crate) registry: Arc<ToolRegistry>,
    pub(crate) settings: Settings,
    pub(crate) transcript: Transcript,
    pub(crate) last_response: String,
    orchestrator: Orchestrator,
}

impl Repl {
    pub fn new(client: Arc<OllamaClient>, registry: Arc<ToolRegistry>, settings: Settings) -> Self {
        let orchestrator = Orchestrator::new(client.clone(), registry.clone());
        Self {
            client,
            registry,
            settings,
            transcript: Transcript::new(),
            last_response: String::new(),
            orchestrator,
        }
    }

    pub async fn run(mut self, initial_prompt: Option<String>) -> anyhow::Result<()> {
        self.print_banner();

        if let Some(prompt) = initial_prompt {
            println!("\n{} {}", "You:".green().bold(), prompt);
            self.run_turn(&prompt).await;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("\n{} ", "You:".green().bold());
            std::io::stdout().flush().ok();

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    println!("\nUse /quit or /exit to exit");
                    continue;
                }
            };

            let Some(line) = line else {
                println!("\nGoodbye!");
                break; // EOF
            };
            let input = line.trim().to_string();
            if input.is_empty() {
                continue;
            }

            if input.starts_with('/') {
                match self.handle_command(&input).await {
                    crate::commands::CommandOutcome::Continue => continue,
                    crate::commands::CommandOutcome::Quit => {
                        println!("Goodbye!");
                        break;
                    }
                }
            }

            self.run_turn(&input).await;
        }

        Ok(())
    }

    /// Run one user turn with Ctrl-C wired to cancellation
    async fn run_turn(&mut self, input: &str) {
        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let (tx, rx) = mpsc::channel(256);
        let printer = tokio::spawn(print_events(rx));

        let result = self
            .orchestrator
            .run_turn(&mut self.transcript, &self.settings, input, tx, cancel)
            .await;

        watcher.abort();
        let _ = printer.await;

        match result {
            Ok(text) if !text.is_empty() => self.last_response = text,
            Ok(_) => {}
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
    }

    fn print_banner(&self) {
        let flag = |on: bool| {
            if on {
                "enabled".green()
            } else {
                "disabled".red()
            }
        };

        println!("\n{} - local coding assistant", "OllamaCode".magenta().bold());
        println!("Using model: {}", self.settings.model.as_str().bold());
        println!("Bash commands: {}", flag(self.settings.enable_bash));
        println!("Tools: {}", flag(self.settings.enable_tools));
        println!("Safe mode: {}", flag(self.settings.safe_mode));
        println!("Auto-save code: {}", flag(self.settings.auto_save_code));
        println!("Auto-run Python: {}", flag(self.settings.auto_run_python));
        println!(
            "Working directory: {}",
            self.settings.working_directory.display()
        );
        println!(
            "Type {} for available commands or {} to exit",
            "/help".yellow(),
            "/quit".yellow()
        );
    }
}

/// Print turn events as they arrive
async fn print_events(mut rx: mpsc::Receiver<TurnEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            TurnEvent::Thinking => {
                println!("{}", "thinking...".dark_grey());
            }
            TurnEvent::AssistantText(text) => {
                println!("\n{} {}", "OllamaCode:".cyan().bold(), text);
            }
            TurnEvent::ToolStart { name } => {
                println!("{} {}", "Executing tool:".yellow(), name);
            }
            TurnEvent::ToolFinished {
                name,
                success,
                preview,
            } => {
                let mark = if success {
                    "ok".green()
                } else {
                    "failed".red()
                };
                println!("[{}] {} {}", name, mark, preview.as_str().dark_grey());
            }
            TurnEvent::CodeSaved { path } => {
                println!("{} {}", "Code saved to".green(), path.display());
            }
            TurnEvent::Notice(notice) => {
                println!("{}", notice.as_str().yellow());
            }
            TurnEvent::TurnError(error) => {
                println!("{} {}", "Error:".red().bold(), error);
            }
            TurnEvent::Done => {}
        }
    }
}
