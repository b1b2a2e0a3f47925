//! OllamaCode CLI - Main entry point

mod commands;
mod repl;

use clap::Parser;
use ollamacode_core::ToolRegistry;
use ollamacode_foundation::Settings;
use ollamacode_provider::{ModelClient, OllamaClient};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// OllamaCode - a chat-driven coding assistant for local Ollama models
#[derive(Parser, Debug)]
#[command(name = "ollamacode")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The initial prompt (optional)
    prompt: Vec<String>,

    /// Ollama model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama API endpoint
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Sampling temperature (0.0-1.0)
    #[arg(short, long)]
    temperature: Option<f32>,

    /// Working directory for bash and tools
    #[arg(long)]
    workspace: Option<String>,

    /// List available models and exit
    #[arg(short, long)]
    list_models: bool,

    /// Disable bash command execution
    #[arg(long)]
    disable_bash: bool,

    /// Disable tools
    #[arg(long)]
    disable_tools: bool,

    /// Disable safety restrictions
    #[arg(long = "unsafe")]
    unsafe_mode: bool,

    /// Automatically save code blocks to files
    #[arg(long)]
    auto_save: bool,

    /// Automatically run Python code blocks
    #[arg(long)]
    auto_run: bool,

    /// Subdirectory for saved code
    #[arg(long)]
    code_dir: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration and apply CLI overrides
    let mut settings = Settings::load();
    if let Some(model) = args.model {
        settings.model = model;
    }
    if let Some(endpoint) = args.endpoint {
        settings.ollama_endpoint = endpoint;
    }
    if let Some(temperature) = args.temperature {
        settings.temperature = temperature;
    }
    if let Some(workspace) = args.workspace {
        settings.working_directory = std::path::PathBuf::from(workspace);
    }
    if args.disable_bash {
        settings.enable_bash = false;
    }
    if args.disable_tools {
        settings.enable_tools = false;
    }
    if args.unsafe_mode {
        settings.safe_mode = false;
    }
    if args.auto_save {
        settings.auto_save_code = true;
    }
    if args.auto_run {
        settings.auto_run_python = true;
    }
    if let Some(code_dir) = args.code_dir {
        settings.code_directory = code_dir;
    }
    settings.normalize();

    let client = Arc::new(OllamaClient::new(&settings.ollama_endpoint));

    // The model server is a hard dependency; fail early with a hint
    if !client.ping().await {
        eprintln!(
            "Error: Cannot connect to Ollama at {}",
            settings.ollama_endpoint
        );
        eprintln!("Make sure Ollama is running and accessible.");
        std::process::exit(1);
    }

    if args.list_models {
        match client.list_models().await {
            Ok(models) if !models.is_empty() => {
                println!("Available Ollama models:");
                for model in models {
                    let marker = if model == settings.model { "* " } else { "  " };
                    println!("{}{}", marker, model);
                }
            }
            _ => println!("No models found or couldn't retrieve model list."),
        }
        return Ok(());
    }

    if !client.has_model(&settings.model).await {
        eprintln!("Warning: Model '{}' not found in Ollama.", settings.model);
        eprintln!("You may need to pull it first with: ollama pull {}", settings.model);
    }

    let registry = Arc::new(ToolRegistry::with_builtins());
    let initial_prompt = if args.prompt.is_empty() {
        None
    } else {
        Some(args.prompt.join(" "))
    };

    repl::Repl::new(client, registry, settings)
        .run(initial_prompt)
        .await?;

    Ok(())
}
