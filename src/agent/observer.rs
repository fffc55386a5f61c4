// ABOUTME: Observer hooks for UI projection of a turn — prompt, thinking, text, tools, errors.
// ABOUTME: Hook failures are logged and ignored; they never change the turn's control flow.

use serde_json::Value;

use crate::history::ContentBlock;

/// Receives turn events. Every method defaults to a no-op.
///
/// Hosts that want to abort a turn cancel its `CancellationToken`; returning an
/// error from a hook only produces a warning.
pub trait Observer: Send + Sync {
    fn on_user_prompt(&self, _prompt: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called before each completion request is issued, including retries.
    fn on_completion_start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_assistant_text(&self, _text: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_tool_start(&self, _name: &str, _arguments: &Value) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_tool_result(&self, _name: &str, _result: &ContentBlock) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_error(&self, _message: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Log a failed hook without propagating it.
pub(crate) fn notify(event: &str, result: anyhow::Result<()>) {
    if let Err(e) = result {
        tracing::warn!(event, error = %e, "Observer hook failed");
    }
}
