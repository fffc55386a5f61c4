// ABOUTME: ToolInvoker trait — one per connected tool server — plus tool specs and results.
// ABOUTME: Result payloads are a tagged union of text vs. other items, resolved once.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::tools::dispatcher::NAME_SEPARATOR;

/// A tool as advertised to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub schema: Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }

    /// The same tool renamed to `<server>__<name>`.
    pub fn qualified(&self, server: &str) -> Self {
        Self {
            name: format!("{}{}{}", server, NAME_SEPARATOR, self.name),
            description: self.description.clone(),
            schema: self.schema.clone(),
        }
    }
}

/// One item of a tool's result payload.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputItem {
    Text(String),
    /// Images, resources, or anything else; passed through untouched.
    Other(Value),
}

impl OutputItem {
    /// Resolve a raw payload item: `{"type": "text", "text": ...}` becomes `Text`.
    pub fn from_value(value: Value) -> Self {
        let is_text = value.get("type").and_then(Value::as_str) == Some("text");
        match value.get("text").and_then(Value::as_str) {
            Some(text) if is_text => Self::Text(text.to_string()),
            _ => Self::Other(value),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => json!({ "type": "text", "text": text }),
            Self::Other(value) => value.clone(),
        }
    }
}

/// What a tool server returned for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub items: Vec<OutputItem>,
    /// The tool ran but reported an application-level failure.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            items: vec![OutputItem::Text(text.into())],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            items: vec![OutputItem::Text(text.into())],
            is_error: true,
        }
    }

    /// Build from a raw JSON array of content items; a non-array becomes one item.
    pub fn from_values(value: Value) -> Self {
        let items = match value {
            Value::Array(values) => values.into_iter().map(OutputItem::from_value).collect(),
            other => vec![OutputItem::from_value(other)],
        };
        Self {
            items,
            is_error: false,
        }
    }

    /// The payload as passthrough JSON.
    pub fn content(&self) -> Value {
        Value::Array(self.items.iter().map(OutputItem::to_value).collect())
    }

    /// Text items joined by a single space, trailing whitespace trimmed.
    pub fn flattened_text(&self) -> String {
        let mut text = String::new();
        for item in &self.items {
            if let OutputItem::Text(t) = item {
                text.push_str(t);
                text.push(' ');
            }
        }
        text.trim_end().to_string()
    }
}

/// A connected tool server.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Tools offered by this server, with unqualified names.
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolSpec>>;

    async fn call_tool(&self, name: &str, arguments: Value) -> anyhow::Result<ToolOutput>;

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
