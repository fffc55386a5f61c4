// ABOUTME: Agent module — the turn loop and the observer it reports progress to.
// ABOUTME: A turn runs completion and tool rounds until the provider stops asking for tools.

pub mod r#loop;
pub mod observer;

pub use r#loop::{TurnEngine, TurnOutcome, TurnSettings};
pub use observer::{NoopObserver, Observer};
