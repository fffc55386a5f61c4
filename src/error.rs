// ABOUTME: Error taxonomy for the turn loop — provider, dispatch, and turn-level failures.
// ABOUTME: Setup paths (config, session wiring) use anyhow; the core uses these typed errors.

use thiserror::Error;

/// Marker substrings that providers use to signal temporary capacity exhaustion.
const OVERLOAD_MARKERS: &[&str] = &["overloaded_error", "overloaded"];

/// How a provider failure should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Temporary overload; retried with backoff.
    Overloaded,
    /// Anything else; propagated immediately.
    Fatal,
}

/// Error returned by a `Provider` implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn overloaded(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Overloaded, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Fatal, message)
    }

    /// Build an error from a raw provider message, recognizing overload markers.
    ///
    /// Useful for SDKs that only surface a string.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if OVERLOAD_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::overloaded(message)
        } else {
            Self::fatal(message)
        }
    }

    pub fn is_overloaded(&self) -> bool {
        self.kind == ProviderErrorKind::Overloaded
    }
}

/// Reasons a tool call could not be routed to an invoker.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("invalid tool name format: {0}")]
    MalformedName(String),

    #[error("server not found: {0}")]
    UnknownServer(String),
}

/// Failures that abort a turn.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("provider is currently overloaded after {retries} retries, please wait a few minutes and try again")]
    Overloaded { retries: u32 },

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("turn exceeded the maximum of {0} tool rounds")]
    MaxRoundsExceeded(usize),
}
