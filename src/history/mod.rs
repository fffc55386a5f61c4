// ABOUTME: Conversation history — typed messages and the windowed store that owns them.
// ABOUTME: Pruning drops old messages and any tool_use/tool_result left without its pair.

pub mod message;
pub mod store;

pub use message::*;
pub use store::*;
