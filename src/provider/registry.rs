// ABOUTME: Named provider factories selected once at session setup from a `provider:model` string.
// ABOUTME: Resolves API keys from config first, then from the provider's environment variables.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, bail};

use crate::config::LlmConfig;
use crate::provider::Provider;

/// Everything a factory needs to build a provider instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSettings {
    pub model: String,
    pub system_prompt: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Builds a provider from resolved settings.
pub type ProviderFactory =
    Arc<dyn Fn(ProviderSettings) -> anyhow::Result<Arc<dyn Provider>> + Send + Sync>;

struct Entry {
    factory: ProviderFactory,
    /// Environment variables consulted, in order, when config has no key.
    key_env: Vec<String>,
    requires_key: bool,
}

/// Registry of provider factories keyed by provider name.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: HashMap<String, Entry>,
}

/// Split `provider:model` on the first colon. The model part may contain colons.
pub fn parse_model_spec(spec: &str) -> anyhow::Result<(&str, &str)> {
    match spec.split_once(':') {
        Some((provider, model)) if !provider.is_empty() && !model.is_empty() => {
            Ok((provider, model))
        }
        _ => bail!("invalid model format. Expected provider:model, got {}", spec),
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider that needs no credentials (e.g. a local model server).
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(ProviderSettings) -> anyhow::Result<Arc<dyn Provider>> + Send + Sync + 'static,
    {
        self.entries.insert(
            name.to_string(),
            Entry {
                factory: Arc::new(factory),
                key_env: Vec::new(),
                requires_key: false,
            },
        );
        self
    }

    /// Register a provider that requires an API key, looked up in `key_env` when
    /// the config does not carry one.
    pub fn register_with_key<F>(&mut self, name: &str, key_env: &[&str], factory: F) -> &mut Self
    where
        F: Fn(ProviderSettings) -> anyhow::Result<Arc<dyn Provider>> + Send + Sync + 'static,
    {
        self.entries.insert(
            name.to_string(),
            Entry {
                factory: Arc::new(factory),
                key_env: key_env.iter().map(|s| s.to_string()).collect(),
                requires_key: true,
            },
        );
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names of all registered providers, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build the provider named by `config.model`.
    pub fn create(&self, config: &LlmConfig, system_prompt: &str) -> anyhow::Result<Arc<dyn Provider>> {
        let (name, model) = parse_model_spec(&config.model)?;
        let Some(entry) = self.entries.get(name) else {
            bail!(
                "unsupported provider: {}. Expected one of: {}",
                name,
                self.names().join(", ")
            );
        };

        let provider_config = config.providers.get(name);
        let api_key = provider_config
            .and_then(|c| c.api_key.clone())
            .filter(|k| !k.is_empty())
            .or_else(|| {
                entry
                    .key_env
                    .iter()
                    .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            });

        if entry.requires_key && api_key.is_none() {
            let hint = if entry.key_env.is_empty() {
                String::new()
            } else {
                format!(" or the {} environment variable", entry.key_env.join(" / "))
            };
            bail!(
                "{} API key not provided. Set llm.providers.{}.api_key{}",
                name,
                name,
                hint
            );
        }

        let settings = ProviderSettings {
            model: model.to_string(),
            system_prompt: system_prompt.to_string(),
            api_key,
            base_url: provider_config
                .and_then(|c| c.base_url.clone())
                .filter(|u| !u.is_empty()),
        };

        let provider = (entry.factory)(settings)
            .with_context(|| format!("failed to create provider '{}'", name))?;
        tracing::info!(provider = provider.name(), model, "Model loaded");
        Ok(provider)
    }
}
