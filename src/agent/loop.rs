// ABOUTME: Turn loop — drives conversation between user, provider, and tool servers.
// ABOUTME: Each round prunes history, requests a completion, and dispatches its tool calls in order.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::agent::observer::{Observer, notify};
use crate::error::{AgentError, DispatchError};
use crate::history::{ContentBlock, HistoryStore, Message};
use crate::provider::{Completion, ProviderGateway, Usage};
use crate::session::TranscriptLogger;
use crate::tools::ToolDispatcher;

/// Default number of most recent messages sent to the provider.
pub const DEFAULT_MESSAGE_WINDOW: usize = 10;

/// Default cap on completion rounds within one turn.
pub const DEFAULT_MAX_ROUNDS: usize = 100;

/// Per-turn limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSettings {
    /// Messages kept when pruning; zero disables pruning.
    pub message_window: usize,
    /// Completion rounds allowed before the turn is aborted.
    pub max_rounds: usize,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            message_window: DEFAULT_MESSAGE_WINDOW,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

/// Summary of a settled turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Completion requests issued.
    pub rounds: usize,
    /// Tool calls that produced a result message.
    pub tool_calls: usize,
    pub usage: Usage,
}

/// Runs turns against one provider and one set of tool servers.
pub struct TurnEngine {
    gateway: ProviderGateway,
    dispatcher: Arc<ToolDispatcher>,
    settings: TurnSettings,
    transcript: Option<Arc<Mutex<TranscriptLogger>>>,
}

impl TurnEngine {
    pub fn new(gateway: ProviderGateway, dispatcher: Arc<ToolDispatcher>, settings: TurnSettings) -> Self {
        Self {
            gateway,
            dispatcher,
            settings,
            transcript: None,
        }
    }

    /// Mirror every appended message to a JSONL transcript.
    pub fn with_transcript(mut self, transcript: Arc<Mutex<TranscriptLogger>>) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Run one turn to completion.
    ///
    /// A non-empty `prompt` is appended as a user message first. The loop then
    /// alternates completions and tool rounds, continuing with an empty prompt
    /// while tools ran, and settles on the first completion without tool calls.
    /// Provider failures and cancellation abort the turn; tool failures do not.
    pub async fn run_turn(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
        history: &mut HistoryStore,
        observer: &dyn Observer,
    ) -> Result<TurnOutcome, AgentError> {
        let mut outcome = TurnOutcome::default();
        let mut prompt = prompt;

        loop {
            if outcome.rounds >= self.settings.max_rounds {
                tracing::error!(max_rounds = self.settings.max_rounds, "Tool round limit reached");
                return Err(AgentError::MaxRoundsExceeded(self.settings.max_rounds));
            }

            if !prompt.is_empty() {
                notify("user_prompt", observer.on_user_prompt(prompt));
                self.record(history, Message::user(prompt)).await;
            }

            history.prune(self.settings.message_window);

            let completion = self
                .gateway
                .complete(cancel, prompt, history.messages(), self.dispatcher.tools(), observer)
                .await?;
            outcome.rounds += 1;
            outcome.usage.add(completion.usage);
            tracing::debug!(
                round = outcome.rounds,
                tool_calls = completion.tool_calls.len(),
                input_tokens = completion.usage.input_tokens,
                output_tokens = completion.usage.output_tokens,
                "Completion received"
            );

            if !completion.text.is_empty() {
                notify("assistant_text", observer.on_assistant_text(&completion.text));
            }
            self.record(history, assistant_message(&completion)).await;

            let ran = self.dispatch_round(cancel, &completion, history, observer).await?;
            outcome.tool_calls += ran;
            if ran == 0 {
                return Ok(outcome);
            }

            prompt = "";
        }
    }

    /// Dispatch every tool call of one completion, appending a tool message per
    /// result as it arrives. Returns how many calls produced a result.
    async fn dispatch_round(
        &self,
        cancel: &CancellationToken,
        completion: &Completion,
        history: &mut HistoryStore,
        observer: &dyn Observer,
    ) -> Result<usize, AgentError> {
        let mut ran = 0;

        for (i, call) in completion.tool_calls.iter().enumerate() {
            notify("tool_start", observer.on_tool_start(&call.name, &call.arguments));

            let dispatched = match self
                .dispatcher
                .invoke(cancel, &call.name, call.arguments.clone(), &call.id)
                .await
            {
                Ok(dispatched) => dispatched,
                Err(err @ DispatchError::MalformedName(_)) => {
                    tracing::warn!(tool = %call.name, "Skipping tool call with malformed name");
                    notify("error", observer.on_error(&err.to_string()));
                    continue;
                }
                Err(err @ DispatchError::UnknownServer(_)) => {
                    tracing::warn!(tool = %call.name, error = %err, "Tool call routed to unknown server");
                    notify("error", observer.on_error(&err.to_string()));
                    let block = ContentBlock::tool_error(&call.id, err.to_string());
                    notify("tool_result", observer.on_tool_result(&call.name, &block));
                    self.record(history, Message::tool(block)).await;
                    ran += 1;
                    continue;
                }
            };

            if let Some(error) = &dispatched.error {
                notify("error", observer.on_error(error));
            }
            notify("tool_result", observer.on_tool_result(&call.name, &dispatched.block));
            self.record(history, Message::tool(dispatched.block)).await;
            ran += 1;

            if dispatched.cancelled {
                // Calls that never started still need a result to pair their tool_use.
                for rest in &completion.tool_calls[i + 1..] {
                    let block = ContentBlock::tool_error(&rest.id, "Tool call cancelled");
                    self.record(history, Message::tool(block)).await;
                }
                return Err(AgentError::Cancelled);
            }
        }

        Ok(ran)
    }

    async fn record(&self, history: &mut HistoryStore, message: Message) {
        if let Some(transcript) = &self.transcript {
            let mut guard = transcript.lock().await;
            if let Err(e) = guard.log_message(&message) {
                tracing::warn!(error = %e, "Failed to write transcript entry");
            }
        }
        history.append(message);
    }
}

/// Assistant message for a completion: its text (if any), then one tool_use per call.
fn assistant_message(completion: &Completion) -> Message {
    let mut content = Vec::with_capacity(completion.tool_calls.len() + 1);
    if !completion.text.is_empty() {
        content.push(ContentBlock::text(&completion.text));
    }
    content.extend(
        completion
            .tool_calls
            .iter()
            .map(|call| ContentBlock::tool_use(&call.id, &call.name, call.arguments.clone())),
    );
    Message::new(completion.role, content)
}
