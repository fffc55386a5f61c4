// ABOUTME: Library root for toolhost — an LLM agent host with tool dispatch.
// ABOUTME: Exposes the turn loop, history, provider gateway, tools, and session wiring.

pub mod agent;
pub mod config;
pub mod error;
pub mod history;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod telemetry;
pub mod tools;

pub use agent::{Observer, TurnEngine, TurnOutcome};
pub use error::{AgentError, DispatchError, ProviderError};
pub use history::{ContentBlock, HistoryStore, Message, Role};
pub use provider::{Completion, Provider, ProviderGateway, RetryPolicy, ToolCall, Usage};
pub use session::Session;
pub use tools::{OutputItem, ToolDispatcher, ToolInvoker, ToolOutput, ToolSpec};
