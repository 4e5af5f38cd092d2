//! Agent runner implementations.

pub mod claude_code;
pub mod mock;

pub use claude_code::ClaudeCodeAgent;
pub use mock::{MockAgent, MockStep};
