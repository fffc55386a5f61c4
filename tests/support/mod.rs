// ABOUTME: Shared test doubles — a scripted provider, a recording tool server, and an event observer.
// ABOUTME: Used by the turn loop and session integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use toolhost::{
    Completion, ContentBlock, Message, Observer, Provider, ProviderError, ToolInvoker, ToolOutput,
    ToolSpec,
};

/// What the provider saw on one request.
#[derive(Debug, Clone)]
pub struct Request {
    pub prompt: String,
    pub history: Vec<Message>,
    pub tool_names: Vec<String>,
}

/// Replays scripted completions; answers "done" once the script runs out.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Completion, ProviderError>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<Completion, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn create_message(
        &self,
        prompt: &str,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<Completion, ProviderError> {
        self.requests.lock().unwrap().push(Request {
            prompt: prompt.to_string(),
            history: history.to_vec(),
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Completion::text("done")))
    }
}

/// A tool server that records calls. `fail` errors, `hang` never returns,
/// everything else echoes.
pub struct RecordingServer {
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl RecordingServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }
}

#[async_trait]
impl ToolInvoker for RecordingServer {
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolSpec>> {
        Ok(vec![
            ToolSpec::new("echo", "Echo arguments", json!({"type": "object"})),
            ToolSpec::new("fail", "Always fails", json!({"type": "object"})),
        ])
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> anyhow::Result<ToolOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        match name {
            "fail" => anyhow::bail!("disk on fire"),
            "hang" => std::future::pending().await,
            _ => Ok(ToolOutput::text(format!("{} ran", name))),
        }
    }
}

/// Records observer events as short strings.
#[derive(Default)]
pub struct EventLog {
    pub events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl Observer for EventLog {
    fn on_user_prompt(&self, prompt: &str) -> anyhow::Result<()> {
        self.push(format!("prompt:{}", prompt));
        Ok(())
    }

    fn on_completion_start(&self) -> anyhow::Result<()> {
        self.push("thinking".to_string());
        // Hook failures must not affect the turn.
        anyhow::bail!("spinner unavailable")
    }

    fn on_assistant_text(&self, text: &str) -> anyhow::Result<()> {
        self.push(format!("text:{}", text));
        Ok(())
    }

    fn on_tool_start(&self, name: &str, _arguments: &Value) -> anyhow::Result<()> {
        self.push(format!("tool_start:{}", name));
        Ok(())
    }

    fn on_tool_result(&self, name: &str, _result: &ContentBlock) -> anyhow::Result<()> {
        self.push(format!("tool_result:{}", name));
        Ok(())
    }

    fn on_error(&self, message: &str) -> anyhow::Result<()> {
        self.push(format!("error:{}", message));
        Ok(())
    }
}
