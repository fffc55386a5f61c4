// ABOUTME: Append-only conversation store with windowed pruning.
// ABOUTME: Pruning yields a new sequence and strips orphaned tool_use/tool_result blocks.

use std::collections::HashSet;

use crate::history::{ContentBlock, Message, Role};

/// Ordered conversation history for one session.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    messages: Vec<Message>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message to the tail.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// Replace the stored sequence with its pruned form.
    pub fn prune(&mut self, window: usize) {
        if self.messages.len() > window && window > 0 {
            self.messages = prune(&self.messages, window);
        }
    }
}

impl From<Vec<Message>> for HistoryStore {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

/// Keep the last `window` messages, dropping tool blocks whose pair fell outside.
///
/// A `window` of zero disables pruning. Messages are dropped whole, never sliced.
/// After block filtering a message survives if it still has a block, or if it is
/// not an assistant message and originally carried text.
pub fn prune(messages: &[Message], window: usize) -> Vec<Message> {
    if window == 0 || messages.len() <= window {
        return messages.to_vec();
    }

    let kept = &messages[messages.len() - window..];

    let mut tool_use_ids: HashSet<&str> = HashSet::new();
    let mut tool_result_ids: HashSet<&str> = HashSet::new();
    for block in kept.iter().flat_map(|msg| &msg.content) {
        match block {
            ContentBlock::ToolUse { id, .. } => {
                tool_use_ids.insert(id);
            }
            ContentBlock::ToolResult { tool_use_id, .. } => {
                tool_result_ids.insert(tool_use_id);
            }
            ContentBlock::Text { .. } => {}
        }
    }

    let mut pruned = Vec::with_capacity(kept.len());
    for msg in kept {
        let blocks: Vec<ContentBlock> = msg
            .content
            .iter()
            .filter(|block| match block {
                ContentBlock::ToolUse { id, .. } => tool_result_ids.contains(id.as_str()),
                ContentBlock::ToolResult { tool_use_id, .. } => {
                    tool_use_ids.contains(tool_use_id.as_str())
                }
                ContentBlock::Text { .. } => true,
            })
            .cloned()
            .collect();

        let keep = if msg.role == Role::Assistant {
            !blocks.is_empty()
        } else {
            !blocks.is_empty() || msg.has_text()
        };
        if keep {
            pruned.push(Message::new(msg.role, blocks));
        }
    }
    pruned
}
