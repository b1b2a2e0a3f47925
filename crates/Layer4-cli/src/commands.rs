//! Slash commands
//!
//! Thin dispatchers onto the configuration snapshot and the transcript.
//! Toggles clone-and-save the settings; a turn already running keeps the
//! snapshot it started with.

use crate::repl::Repl;
use crossterm::style::Stylize;
use ollamacode_provider::ModelClient;

/// What the REPL should do after a command
pub enum CommandOutcome {
    Continue,
    Quit,
}

impl Repl {
    pub(crate) async fn handle_command(&mut self, input: &str) -> CommandOutcome {
        let (command, arg) = match input.split_once(' ') {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };

        match command {
            "/quit" | "/exit" | "/q" => return CommandOutcome::Quit,
            "/help" => self.show_help(),
            "/clear" => {
                self.transcript.clear();
                println!("{}", "Conversation history cleared.".yellow());
            }
            "/models" => self.list_models().await,
            "/model" => self.switch_model(arg).await,
            "/temp" => self.set_temperature(arg),
            "/config" => self.show_config(),
            "/tools" => self.show_tools(),
            "/toggle_bash" => {
                self.settings.enable_bash = !self.settings.enable_bash;
                self.save_settings();
                println!("Bash execution {}.", enabled(self.settings.enable_bash));
            }
            "/toggle_tools" => {
                self.settings.enable_tools = !self.settings.enable_tools;
                self.save_settings();
                println!("Tools {}.", enabled(self.settings.enable_tools));
            }
            "/toggle_safe" => {
                self.settings.safe_mode = !self.settings.safe_mode;
                self.save_settings();
                println!("Safe mode {}.", enabled(self.settings.safe_mode));
                if !self.settings.safe_mode {
                    println!(
                        "{}",
                        "Warning: Disabling safe mode removes security restrictions.".yellow()
                    );
                }
            }
            "/toggle_auto_save" => {
                self.settings.auto_save_code = !self.settings.auto_save_code;
                self.save_settings();
                println!("Auto-save code {}.", enabled(self.settings.auto_save_code));
            }
            "/toggle_auto_run" => {
                self.settings.auto_run_python = !self.settings.auto_run_python;
                self.save_settings();
                println!("Auto-run Python {}.", enabled(self.settings.auto_run_python));
            }
            "/workspace" => self.show_workspace(),
            "/list_code" => self.list_code(),
            "/save" => self.save_response(arg),
            other => {
                println!(
                    "Unknown command: {}. Type {} for available commands.",
                    other,
                    "/help".yellow()
                );
            }
        }

        CommandOutcome::Continue
    }

    fn show_help(&self) {
        println!("\n{}", "OllamaCode Help".magenta().bold());
        let entries = [
            ("/help", "Show this help message"),
            ("/quit, /exit", "Exit OllamaCode"),
            ("/clear", "Clear the conversation history"),
            ("/models", "List available models in Ollama"),
            ("/model <name>", "Switch to a different model"),
            ("/temp <value>", "Set temperature (0.0-1.0)"),
            ("/config", "Show current configuration"),
            ("/tools", "List available tools"),
            ("/toggle_bash", "Enable/disable bash execution"),
            ("/toggle_tools", "Enable/disable tools"),
            ("/toggle_safe", "Enable/disable safe mode"),
            ("/toggle_auto_save", "Enable/disable automatic code saving"),
            ("/toggle_auto_run", "Enable/disable automatic Python execution"),
            ("/workspace", "Show working directory"),
            ("/list_code", "List saved code files"),
            ("/save <path>", "Save the last response to a file"),
        ];
        for (cmd, desc) in entries {
            println!("  {:<22} {}", cmd.yellow(), desc);
        }
    }

    async fn list_models(&self) {
        match self.client.list_models().await {
            Ok(models) if !models.is_empty() => {
                println!("{}", "Available models:".bold());
                for model in models {
                    let marker = if model == self.settings.model { "* " } else { "  " };
                    println!("{}{}", marker, model);
                }
            }
            _ => println!(
                "{}",
                "No models found or couldn't retrieve model list.".yellow()
            ),
        }
    }

    async fn switch_model(&mut self, name: &str) {
        if name.is_empty() {
            println!("Current model: {}", self.settings.model.as_str().bold());
            return;
        }
        if !self.client.has_model(name).await {
            println!("{} Model '{}' not found in Ollama.", "Error:".red(), name);
            println!("You may need to pull it first with: ollama pull {}", name);
            return;
        }
        self.settings.model = name.to_string();
        self.save_settings();
        println!("{} {}", "Switched to model:".green(), name);
    }

    fn set_temperature(&mut self, arg: &str) {
        match arg.parse::<f32>() {
            Ok(value) if (0.0..=1.0).contains(&value) => {
                self.settings.temperature = value;
                self.save_settings();
                println!("{} {}", "Temperature set to".green(), value);
            }
            Ok(_) => println!("{}", "Temperature must be between 0.0 and 1.0".yellow()),
            Err(_) => println!("{}", "Invalid temperature value".yellow()),
        }
    }

    fn show_config(&self) {
        println!("{}", "Current configuration:".bold());
        println!("  ollama_endpoint: {}", self.settings.ollama_endpoint);
        println!("  model: {}", self.settings.model);
        println!("  temperature: {}", self.settings.temperature);
        println!("  max_tokens: {}", self.settings.max_tokens);
        println!("  context_window: {}", self.settings.context_window);
        println!("  enable_bash: {}", self.settings.enable_bash);
        println!("  enable_tools: {}", self.settings.enable_tools);
        println!("  safe_mode: {}", self.settings.safe_mode);
        println!("  auto_save_code: {}", self.settings.auto_save_code);
        println!("  auto_run_python: {}", self.settings.auto_run_python);
        println!("  code_directory: {}", self.settings.code_directory);
        println!(
            "  process_followup_commands: {}",
            self.settings.process_followup_commands
        );
        println!(
            "  max_followup_depth: {}",
            self.settings.max_followup_depth
        );
        println!(
            "  working_directory: {}",
            self.settings.working_directory.display()
        );
    }

    fn show_tools(&self) {
        println!("\n{}", "Available Tools".magenta().bold());
        println!(
            "Tools: {}  Bash: {}  Safe mode: {}",
            enabled(self.settings.enable_tools),
            enabled(self.settings.enable_bash),
            enabled(self.settings.safe_mode),
        );
        for (name, description, dangerous) in self.registry.list() {
            let marker = if dangerous { " (dangerous)".red() } else { "".stylize() };
            println!("  {:<12} {}{}", name.yellow(), description, marker);
        }
        println!("\nModels request tools with a ```tool fenced JSON block,");
        println!("and bash with ```bash code blocks.");
    }

    fn show_workspace(&self) {
        let workspace = &self.settings.working_directory;
        println!("Current working directory: {}", workspace.display());

        match std::fs::read_dir(workspace) {
            Ok(entries) => {
                let mut names: Vec<_> = entries
                    .flatten()
                    .map(|e| {
                        let suffix = if e.path().is_dir() { "/" } else { "" };
                        format!("{}{}", e.file_name().to_string_lossy(), suffix)
                    })
                    .collect();
                names.sort();
                if names.is_empty() {
                    println!("Directory is empty.");
                } else {
                    println!("Contents ({} items):", names.len());
                    for name in names {
                        println!("  {}", name);
                    }
                }
            }
            Err(e) => println!("{} {}", "Error reading directory:".red(), e),
        }
    }

    fn list_code(&self) {
        let code_dir = self.settings.code_dir();
        match std::fs::read_dir(&code_dir) {
            Ok(entries) => {
                let mut files: Vec<_> = entries
                    .flatten()
                    .filter(|e| e.path().is_file())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect();
                files.sort();
                if files.is_empty() {
                    println!("No code files found in {}", code_dir.display());
                } else {
                    println!("{} {}:", "Saved code files in".bold(), code_dir.display());
                    for file in files {
                        println!("  {}", file.as_str().cyan());
                    }
                }
            }
            Err(_) => println!("No code files found in {}", code_dir.display()),
        }
    }

    fn save_response(&self, path: &str) {
        if self.last_response.is_empty() {
            println!("{}", "No response to save.".yellow());
            return;
        }
        if path.is_empty() {
            println!("{}", "Please specify a file path.".yellow());
            return;
        }
        match std::fs::write(path, &self.last_response) {
            Ok(()) => println!("{} {}", "Response saved to".green(), path),
            Err(e) => println!("{} {}", "Error saving file:".red(), e),
        }
    }

    fn save_settings(&self) {
        if let Err(e) = self.settings.save() {
            println!("{} {}", "Warning: could not save settings:".yellow(), e);
        }
    }
}

fn enabled(on: bool) -> &'static str {
    if on {
        "enabled"
    } else {
        "disabled"
    }
}
