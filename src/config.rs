// ABOUTME: Configuration loading for toolhost.
// ABOUTME: Reads ~/.toolhost/config.toml into an immutable struct with serde defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::agent::TurnSettings;
use crate::agent::r#loop::{DEFAULT_MAX_ROUNDS, DEFAULT_MESSAGE_WINDOW};
use crate::provider::RetryPolicy;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub retry: RetryConfig,
    /// Enable debug-level logging.
    pub debug: bool,
}

/// LLM provider selection and credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `provider:model`, e.g. `anthropic:claude-3-5-sonnet-latest` or `ollama:qwen2.5:3b`.
    pub model: String,
    /// JSON file with a `systemPrompt` field.
    pub system_prompt_file: Option<PathBuf>,
    /// Per-provider settings keyed by provider name.
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "anthropic:claude-3-5-sonnet-latest".to_string(),
            system_prompt_file: None,
            providers: HashMap::new(),
        }
    }
}

/// Credentials and endpoint for one provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Turn loop limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub message_window: usize,
    pub max_rounds: usize,
    pub tool_list_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            message_window: DEFAULT_MESSAGE_WINDOW,
            max_rounds: DEFAULT_MAX_ROUNDS,
            tool_list_timeout_secs: 10,
        }
    }
}

impl AgentConfig {
    pub fn turn_settings(&self) -> TurnSettings {
        TurnSettings {
            message_window: self.message_window,
            max_rounds: self.max_rounds,
        }
    }
}

/// Backoff on provider overload.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

impl Config {
    /// Load config from ~/.toolhost/config.toml, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("error reading config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("error parsing config file {}", path.display()))?;
        Ok(config)
    }

    fn base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".toolhost")
    }

    /// Path to the config file.
    pub fn config_path() -> PathBuf {
        Self::base_dir().join("config.toml")
    }

    /// Directory holding session transcripts.
    pub fn sessions_dir() -> PathBuf {
        Self::base_dir().join("sessions")
    }

    /// Log filter used when RUST_LOG is unset.
    pub fn log_filter(&self) -> &'static str {
        crate::telemetry::default_filter(self.debug)
    }

    /// Install the global tracing subscriber at the level `debug` selects.
    /// Hosts call this once at startup, after loading the config.
    pub fn init_tracing(&self) -> anyhow::Result<()> {
        crate::telemetry::init_tracing(self.debug)
    }
}
