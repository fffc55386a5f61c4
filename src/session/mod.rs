// ABOUTME: Session — one provider, one set of tool servers, and the history they share.
// ABOUTME: Built once from immutable config; turns are serialized through `&mut self`.

pub mod log;

pub use log::{LogEntry, TranscriptLogger, read_transcript};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::agent::{Observer, TurnEngine, TurnOutcome, TurnSettings};
use crate::config::Config;
use crate::error::AgentError;
use crate::history::HistoryStore;
use crate::prompt::load_system_prompt;
use crate::provider::{Provider, ProviderGateway, ProviderRegistry, RetryPolicy};
use crate::tools::{ToolDispatcher, ToolInvoker, ToolSpec};

/// A running conversation.
pub struct Session {
    engine: TurnEngine,
    dispatcher: Arc<ToolDispatcher>,
    history: HistoryStore,
}

impl Session {
    /// Select the provider named in `config.llm.model`, load the system prompt,
    /// and collect tools from every server.
    pub async fn new(
        config: &Config,
        registry: &ProviderRegistry,
        servers: Vec<(String, Arc<dyn ToolInvoker>)>,
    ) -> anyhow::Result<Self> {
        // Pick up API keys from a local .env if present.
        let _ = dotenvy::dotenv();

        let system_prompt = load_system_prompt(config.llm.system_prompt_file.as_deref())?;
        let provider = registry.create(&config.llm, &system_prompt)?;

        let timeout = Duration::from_secs(config.agent.tool_list_timeout_secs);
        let dispatcher = ToolDispatcher::connect(servers, timeout).await;

        Ok(Self::from_parts(
            provider,
            dispatcher,
            config.retry.policy(),
            config.agent.turn_settings(),
        ))
    }

    /// Assemble a session from already-built collaborators.
    pub fn from_parts(
        provider: Arc<dyn Provider>,
        dispatcher: ToolDispatcher,
        policy: RetryPolicy,
        settings: TurnSettings,
    ) -> Self {
        let dispatcher = Arc::new(dispatcher);
        let engine = TurnEngine::new(ProviderGateway::new(provider, policy), dispatcher.clone(), settings);
        Self {
            engine,
            dispatcher,
            history: HistoryStore::new(),
        }
    }

    /// Mirror every message of this session to a transcript file.
    pub fn with_transcript(mut self, logger: TranscriptLogger) -> Self {
        self.engine = self.engine.with_transcript(Arc::new(Mutex::new(logger)));
        self
    }

    /// Run one user turn. Blank prompts are ignored.
    pub async fn run_prompt(
        &mut self,
        cancel: &CancellationToken,
        prompt: &str,
        observer: &dyn Observer,
    ) -> Result<TurnOutcome, AgentError> {
        if prompt.trim().is_empty() {
            return Ok(TurnOutcome::default());
        }
        self.engine
            .run_turn(cancel, prompt, &mut self.history, observer)
            .await
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn tools(&self) -> &[ToolSpec] {
        self.dispatcher.tools()
    }

    /// Close every tool server connection.
    pub async fn close(&self) -> anyhow::Result<()> {
        self.dispatcher.close_all().await
    }
}
