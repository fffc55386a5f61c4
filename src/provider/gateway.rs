// ABOUTME: Retrying wrapper around a Provider — bounded exponential backoff on overload.
// ABOUTME: Both the request and the backoff sleep abort promptly on cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::agent::observer::{Observer, notify};
use crate::error::{AgentError, ProviderError};
use crate::history::Message;
use crate::provider::{Completion, Provider};
use crate::tools::ToolSpec;

/// Retry limits for transient overload errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Double the delay, clamped to `max_backoff`.
    pub fn next_backoff(&self, current: Duration) -> Duration {
        (current * 2).min(self.max_backoff)
    }

    /// Every delay a caller would sleep through before giving up.
    pub fn schedule(&self) -> Vec<Duration> {
        let mut delays = Vec::with_capacity(self.max_retries as usize);
        let mut backoff = self.initial_backoff.min(self.max_backoff);
        for _ in 0..self.max_retries {
            delays.push(backoff);
            backoff = self.next_backoff(backoff);
        }
        delays
    }
}

/// Issues completion requests, retrying only on provider overload.
#[derive(Clone)]
pub struct ProviderGateway {
    provider: Arc<dyn Provider>,
    policy: RetryPolicy,
}

impl ProviderGateway {
    pub fn new(provider: Arc<dyn Provider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Request one completion. Retry state is local to this call.
    pub async fn complete(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
        history: &[Message],
        tools: &[ToolSpec],
        observer: &dyn Observer,
    ) -> Result<Completion, AgentError> {
        let mut retries: u32 = 0;
        let mut backoff = self.policy.initial_backoff.min(self.policy.max_backoff);

        loop {
            notify("completion_start", observer.on_completion_start());

            let result: Result<Completion, ProviderError> = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(AgentError::Cancelled),
                result = self.provider.create_message(prompt, history, tools) => result,
            };

            let err = match result {
                Ok(completion) => return Ok(completion),
                Err(err) => err,
            };

            if !err.is_overloaded() {
                return Err(AgentError::Provider(err));
            }
            if retries >= self.policy.max_retries {
                tracing::error!(
                    provider = self.provider.name(),
                    retries,
                    "Provider still overloaded, giving up"
                );
                return Err(AgentError::Overloaded { retries });
            }

            tracing::warn!(
                provider = self.provider.name(),
                attempt = retries + 1,
                backoff = ?backoff,
                "Provider is overloaded, backing off"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(AgentError::Cancelled),
                () = tokio::time::sleep(backoff) => {}
            }

            backoff = self.policy.next_backoff(backoff);
            retries += 1;
        }
    }
}
