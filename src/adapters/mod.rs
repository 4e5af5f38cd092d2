//! Adapters for external systems: the agent subprocess, the validation
//! tools, and the ledger file.

pub mod agents;
pub mod ledger_file;
pub mod validation;

pub use agents::{ClaudeCodeAgent, MockAgent, MockStep};
pub use ledger_file::FileLedgerStore;
pub use validation::ValidationCollector;
