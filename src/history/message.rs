// ABOUTME: Message and content block types exchanged between user, provider, and tools.
// ABOUTME: Serializes with a `type` tag so transcripts stay readable as JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// One typed piece of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: Value,
        /// Flattened text of `content`, for providers that only accept strings.
        text: String,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: Value, text: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content,
            text: text.into(),
        }
    }

    /// A tool_result whose payload is a plain error string.
    pub fn tool_error(tool_use_id: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: Value::String(error.clone()),
            text: error,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

/// A single conversation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Wrap a single tool result block in a tool-role message.
    pub fn tool(block: ContentBlock) -> Self {
        Self::new(Role::Tool, vec![block])
    }

    pub fn has_text(&self) -> bool {
        self.content.iter().any(ContentBlock::is_text)
    }

    /// All text blocks joined with newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `(id, name, input)` for every tool_use block, in order.
    pub fn tool_uses(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => Some((id.as_str(), name.as_str(), input)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_block_serializes_with_type_tag() {
        let block = ContentBlock::tool_use("call-1", "fs__read", json!({"path": "a.txt"}));
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool_use");
        assert_eq!(value["name"], "fs__read");
    }

    #[test]
    fn message_text_joins_text_blocks_only() {
        let msg = Message::assistant(vec![
            ContentBlock::text("first"),
            ContentBlock::tool_use("c", "a__b", json!({})),
            ContentBlock::text("second"),
        ]);
        assert_eq!(msg.text(), "first\nsecond");
        assert!(msg.has_text());
    }

    #[test]
    fn tool_uses_lists_calls_in_order() {
        let msg = Message::assistant(vec![
            ContentBlock::tool_use("1", "a__x", json!({})),
            ContentBlock::tool_use("2", "b__y", json!({})),
        ]);
        let ids: Vec<&str> = msg.tool_uses().map(|(id, _, _)| id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn tool_error_carries_text_in_both_fields() {
        match ContentBlock::tool_error("c1", "boom") {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                text,
            } => {
                assert_eq!(tool_use_id, "c1");
                assert_eq!(content, json!("boom"));
                assert_eq!(text, "boom");
            }
            other => panic!("expected ToolResult, got {:?}", other),
        }
    }

    #[test]
    fn role_roundtrips_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
