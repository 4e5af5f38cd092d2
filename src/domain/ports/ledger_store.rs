//! Ledger store port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Ledger;

/// Access to the environment-owned ledger document.
///
/// The ledger is shared with an external mutator (the agent). Callers must
/// `load` fresh at the start of every cycle and never hold a parsed ledger
/// across an agent invocation.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn load(&self) -> DomainResult<Ledger>;

    async fn save(&self, ledger: &Ledger) -> DomainResult<()>;
}
