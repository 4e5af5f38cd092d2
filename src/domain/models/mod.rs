//! Domain models.

pub mod agent;
pub mod config;
pub mod ledger;
pub mod snapshot;

pub use agent::{AgentOutcome, RunMode, COMPLETION_SENTINEL};
pub use config::{
    AgentConfig, Config, LedgerConfig, LintClassifierConfig, PromptConfig, TestClassifierConfig,
    ValidationConfig,
};
pub use ledger::{Category, Entry, EntryId, EntryStatus, Ledger, Section};
pub use snapshot::ValidationSnapshot;
