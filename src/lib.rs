//! Ostinato - Ledger-Gated Iterative Agent Loop
//!
//! Ostinato drives an autonomous coding agent through a repository's task
//! ledger, one entry per session, feeding each session the latest test and
//! lint results and stopping when the ledger drains, the agent reports
//! completion, or the iteration budget is spent.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): ledger model, validation snapshot, agent
//!   session models, and the port traits over the agent and the ledger store
//! - **Application Layer** (`application`): the pure prompt composer and the
//!   loop controller state machine
//! - **Adapters** (`adapters`): the agent subprocess driver, the scripted
//!   mock agent, the validation collector, and the ledger file store
//! - **Infrastructure** (`infrastructure`): configuration loading
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use ostinato::application::LoopController;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire a ledger store, collector, and agent, then run the loop.
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use adapters::{ClaudeCodeAgent, FileLedgerStore, MockAgent, MockStep, ValidationCollector};
pub use application::{LoopController, LoopEvent, LoopReport, StopCause};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AgentOutcome, Category, Config, Entry, EntryId, EntryStatus, Ledger, RunMode, Section,
    ValidationSnapshot, COMPLETION_SENTINEL,
};
pub use domain::ports::{AgentRunner, LedgerStore};
pub use infrastructure::{ConfigError, ConfigLoader};
