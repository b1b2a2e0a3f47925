//! Configuration snapshot
//!
//! The orchestration loop consumes a single immutable `Settings` value per
//! turn. Toggles in the CLI clone the current snapshot, flip one field, and
//! persist the result; a turn already in flight keeps the snapshot it was
//! started with.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Recognized configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ollama API endpoint
    pub ollama_endpoint: String,

    /// Model identifier
    pub model: String,

    /// Sampling temperature (0.0 - 1.0)
    pub temperature: f32,

    /// Maximum tokens to generate per reply
    pub max_tokens: u32,

    /// Transcript budget in characters before trimming kicks in
    pub context_window: usize,

    /// System prompt prepended to every model call
    pub system_prompt: Option<String>,

    /// Execute bash code blocks emitted by the model
    pub enable_bash: bool,

    /// Execute tool markers emitted by the model
    pub enable_tools: bool,

    /// Restrictive safety policy (command deny-list, workspace-scoped writes)
    pub safe_mode: bool,

    /// Save code blocks from replies into the workspace
    pub auto_save_code: bool,

    /// Run python-tagged code blocks without an explicit tool marker
    pub auto_run_python: bool,

    /// Subdirectory of the workspace for saved code
    pub code_directory: String,

    /// Re-parse tool result text for nested tool requests
    pub process_followup_commands: bool,

    /// Maximum follow-up recursion depth per turn
    pub max_followup_depth: u32,

    /// Working directory for tools and shell commands
    pub working_directory: PathBuf,

    /// Transcript persistence path
    pub history_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            ollama_endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            context_window: 16_000,
            system_prompt: None,
            enable_bash: true,
            enable_tools: true,
            safe_mode: true,
            auto_save_code: false,
            auto_run_python: false,
            code_directory: String::new(),
            process_followup_commands: false,
            max_followup_depth: 2,
            working_directory: home.join("ollamacode_workspace"),
            history_file: home.join(".config/ollamacode/history.json"),
        }
    }
}

impl Settings {
    /// Load settings: defaults, then `./config.json`, then the user config
    ///
    /// Missing files are not an error; a malformed file is reported and
    /// skipped so a broken user config never blocks startup.
    pub fn load() -> Self {
        let mut settings = Settings::default();

        for path in [PathBuf::from("config.json"), Self::user_config_path()] {
            match Self::read_layer(&path) {
                Ok(Some(layer)) => {
                    tracing::debug!(path = %path.display(), "loaded config layer");
                    settings = layer.over(settings);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping config layer");
                }
            }
        }

        settings.normalize();
        settings
    }

    /// Persist to the user config path
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        tracing::info!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// `~/.config/ollamacode/config.json`
    pub fn user_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config/ollamacode/config.json")
    }

    /// Clamp and expand fields after loading or CLI overrides
    pub fn normalize(&mut self) {
        self.temperature = self.temperature.clamp(0.0, 1.0);
        self.working_directory = expand_home(&self.working_directory);
        self.history_file = expand_home(&self.history_file);
    }

    /// Directory where auto-saved code lands
    pub fn code_dir(&self) -> PathBuf {
        if self.code_directory.is_empty() {
            self.working_directory.clone()
        } else {
            self.working_directory.join(&self.code_directory)
        }
    }

    fn read_layer(path: &Path) -> Result<Option<ConfigLayer>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        let layer: ConfigLayer =
            serde_json::from_str(&text).map_err(|e| Error::Config(e.to_string()))?;
        Ok(Some(layer))
    }
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &Path) -> PathBuf {
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Partial config file: only the keys present override the base
#[derive(Debug, Default, Deserialize)]
struct ConfigLayer {
    ollama_endpoint: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    context_window: Option<usize>,
    system_prompt: Option<String>,
    enable_bash: Option<bool>,
    enable_tools: Option<bool>,
    safe_mode: Option<bool>,
    auto_save_code: Option<bool>,
    auto_run_python: Option<bool>,
    code_directory: Option<String>,
    process_followup_commands: Option<bool>,
    max_followup_depth: Option<u32>,
    working_directory: Option<PathBuf>,
    history_file: Option<PathBuf>,
}

impl ConfigLayer {
    fn over(self, mut base: Settings) -> Settings {
        if let Some(v) = self.ollama_endpoint {
            base.ollama_endpoint = v;
        }
        if let Some(v) = self.model {
            base.model = v;
        }
        if let Some(v) = self.temperature {
            base.temperature = v;
        }
        if let Some(v) = self.max_tokens {
            base.max_tokens = v;
        }
        if let Some(v) = self.context_window {
            base.context_window = v;
        }
        if self.system_prompt.is_some() {
            base.system_prompt = self.system_prompt;
        }
        if let Some(v) = self.enable_bash {
            base.enable_bash = v;
        }
        if let Some(v) = self.enable_tools {
            base.enable_tools = v;
        }
        if let Some(v) = self.safe_mode {
            base.safe_mode = v;
        }
        if let Some(v) = self.auto_save_code {
            base.auto_save_code = v;
        }
        if let Some(v) = self.auto_run_python {
            base.auto_run_python = v;
        }
        if let Some(v) = self.code_directory {
            base.code_directory = v;
        }
        if let Some(v) = self.process_followup_commands {
            base.process_followup_commands = v;
        }
        if let Some(v) = self.max_followup_depth {
            base.max_followup_depth = v;
        }
        if let Some(v) = self.working_directory {
            base.working_directory = v;
        }
        if let Some(v) = self.history_file {
            base.history_file = v;
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.ollama_endpoint, "http://localhost:11434");
        assert!(settings.safe_mode);
        assert!(!settings.auto_run_python);
        assert_eq!(settings.max_followup_depth, 2);
    }

    #[test]
    fn test_layer_overrides() {
        let layer: ConfigLayer =
            serde_json::from_str(r#"{"model": "codellama:7b", "temperature": 0.2}"#).unwrap();
        let settings = layer.over(Settings::default());
        assert_eq!(settings.model, "codellama:7b");
        assert_eq!(settings.temperature, 0.2);
        // untouched keys keep their defaults
        assert!(settings.enable_bash);
    }

    #[test]
    fn test_temperature_clamped() {
        let mut settings = Settings {
            temperature: 3.5,
            ..Settings::default()
        };
        settings.normalize();
        assert_eq!(settings.temperature, 1.0);
    }

    #[test]
    fn test_roundtrip() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.model, settings.model);
        assert_eq!(back.working_directory, settings.working_directory);
    }

    #[test]
    fn test_code_dir() {
        let mut settings = Settings::default();
        assert_eq!(settings.code_dir(), settings.working_directory);
        settings.code_directory = "generated".to_string();
        assert_eq!(
            settings.code_dir(),
            settings.working_directory.join("generated")
        );
    }
}
