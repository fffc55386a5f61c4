// ABOUTME: Tool layer — invoker contract for tool servers and the dispatcher that routes calls.
// ABOUTME: Tools are addressed by qualified `<server>__<tool>` names across all servers.

pub mod dispatcher;
pub mod invoker;

pub use dispatcher::*;
pub use invoker::*;
