// ABOUTME: Routes qualified tool calls to the owning server and normalizes the result.
// ABOUTME: Tool failures become tool_result blocks; only routing failures are returned as errors.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;
use crate::history::ContentBlock;
use crate::tools::{ToolInvoker, ToolSpec};

/// Separator between server and tool in a qualified name.
pub const NAME_SEPARATOR: &str = "__";

/// Default time allowed for one server to list its tools at setup.
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Split `<server>__<tool>` into its parts. Exactly one separator is allowed.
pub fn split_qualified_name(name: &str) -> Result<(&str, &str), DispatchError> {
    let parts: Vec<&str> = name.split(NAME_SEPARATOR).collect();
    match parts.as_slice() {
        [server, tool] if !server.is_empty() && !tool.is_empty() => Ok((*server, *tool)),
        _ => Err(DispatchError::MalformedName(name.to_string())),
    }
}

/// The outcome of a routed tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// Always a `tool_result` block paired with the call's id.
    pub block: ContentBlock,
    /// Invocation failure text, if the server call itself failed.
    pub error: Option<String>,
    /// The tool reported an application-level error in its output.
    pub is_error: bool,
    pub cancelled: bool,
}

/// Read-only map of server name to invoker, plus the aggregated tool list.
#[derive(Default)]
pub struct ToolDispatcher {
    invokers: HashMap<String, Arc<dyn ToolInvoker>>,
    tools: Vec<ToolSpec>,
}

impl ToolDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server with an already-known tool list (unqualified names).
    pub fn add_server(&mut self, server: &str, invoker: Arc<dyn ToolInvoker>, tools: &[ToolSpec]) {
        self.tools.extend(tools.iter().map(|t| t.qualified(server)));
        self.invokers.insert(server.to_string(), invoker);
    }

    /// Ask every server for its tools and build the dispatcher.
    ///
    /// A server whose listing fails or times out stays registered with no
    /// advertised tools, so it is still closed at teardown.
    pub async fn connect(servers: Vec<(String, Arc<dyn ToolInvoker>)>, list_timeout: Duration) -> Self {
        let listings = join_all(servers.iter().map(|(name, invoker)| async move {
            match tokio::time::timeout(list_timeout, invoker.list_tools()).await {
                Ok(Ok(tools)) => Some(tools),
                Ok(Err(e)) => {
                    tracing::error!(server = %name, error = %e, "Error fetching tools");
                    None
                }
                Err(_) => {
                    tracing::error!(server = %name, timeout = ?list_timeout, "Timed out fetching tools");
                    None
                }
            }
        }))
        .await;

        let mut dispatcher = Self::new();
        for ((name, invoker), tools) in servers.into_iter().zip(listings) {
            tracing::info!(server = %name, "Server connected");
            let tools = tools.unwrap_or_default();
            if !tools.is_empty() {
                tracing::info!(server = %name, count = tools.len(), "Tools loaded");
            }
            dispatcher.add_server(&name, invoker, &tools);
        }
        dispatcher
    }

    /// All tools across servers, with qualified names.
    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn has_server(&self, server: &str) -> bool {
        self.invokers.contains_key(server)
    }

    /// Route one call. Routing failures are errors; invocation failures are data.
    pub async fn invoke(
        &self,
        cancel: &CancellationToken,
        qualified_name: &str,
        arguments: Value,
        tool_use_id: &str,
    ) -> Result<Dispatched, DispatchError> {
        let (server, tool) = split_qualified_name(qualified_name)?;
        let invoker = self
            .invokers
            .get(server)
            .ok_or_else(|| DispatchError::UnknownServer(server.to_string()))?;

        tracing::debug!(server, tool, "Calling tool");
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Ok(Dispatched {
                    block: ContentBlock::tool_error(tool_use_id, "Tool call cancelled"),
                    error: Some("tool call cancelled".to_string()),
                    is_error: true,
                    cancelled: true,
                });
            }
            result = invoker.call_tool(tool, arguments) => result,
        };

        match result {
            Ok(output) => {
                if output.is_error {
                    tracing::debug!(server, tool, "Tool reported an error result");
                }
                Ok(Dispatched {
                    block: ContentBlock::tool_result(
                        tool_use_id,
                        output.content(),
                        output.flattened_text(),
                    ),
                    error: None,
                    is_error: output.is_error,
                    cancelled: false,
                })
            }
            Err(e) => {
                let message = format!("Error calling tool {}: {}", tool, e);
                tracing::warn!(server, tool, error = %e, "Tool call failed");
                Ok(Dispatched {
                    block: ContentBlock::tool_error(tool_use_id, message.clone()),
                    error: Some(message),
                    is_error: true,
                    cancelled: false,
                })
            }
        }
    }

    /// Close every server; returns the last failure, if any.
    pub async fn close_all(&self) -> anyhow::Result<()> {
        let mut last_err = None;
        for (name, invoker) in &self.invokers {
            match invoker.close().await {
                Ok(()) => tracing::info!(server = %name, "Server closed"),
                Err(e) => {
                    tracing::error!(server = %name, error = %e, "Failed to close server");
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
