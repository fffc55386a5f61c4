// ABOUTME: LLM provider contract — the capability the turn loop needs from any backend.
// ABOUTME: Includes the retrying gateway and the registry of named provider factories.

pub mod gateway;
pub mod registry;

pub use gateway::{ProviderGateway, RetryPolicy};
pub use registry::{ProviderFactory, ProviderRegistry, ProviderSettings, parse_model_spec};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::history::{Message, Role};
use crate::tools::ToolSpec;

/// A tool invocation requested by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    /// Qualified `<server>__<tool>` name.
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn add(&mut self, other: Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// One completion returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub role: Role,
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Usage,
}

impl Completion {
    /// A plain assistant answer with no tool calls.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            tool_calls: Vec::new(),
            usage: Usage::default(),
        }
    }

    pub fn with_tool_call(mut self, call: ToolCall) -> Self {
        self.tool_calls.push(call);
        self
    }

    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.usage = Usage {
            input_tokens,
            output_tokens,
        };
        self
    }
}

/// A model backend. Wire formats and transport live behind this trait.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Issue a single completion request. `history` already contains `prompt`
    /// when it is non-empty; providers that want the raw prompt get it too.
    async fn create_message(
        &self,
        prompt: &str,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<Completion, ProviderError>;
}
