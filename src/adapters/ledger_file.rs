//! File-backed ledger store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::domain::errors::DomainResult;
use crate::domain::models::Ledger;
use crate::domain::ports::LedgerStore;

/// Markdown checklist file on disk. Every `load` re-reads and re-parses the
/// document; nothing is cached, since the agent mutates the file between
/// loads.
pub struct FileLedgerStore {
    path: PathBuf,
    blocking_headings: Vec<String>,
}

impl FileLedgerStore {
    pub fn new(path: impl Into<PathBuf>, blocking_headings: Vec<String>) -> Self {
        Self {
            path: path.into(),
            blocking_headings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LedgerStore for FileLedgerStore {
    async fn load(&self) -> DomainResult<Ledger> {
        let doc = fs::read_to_string(&self.path).await?;
        Ledger::parse(&doc, &self.blocking_headings)
    }

    async fn save(&self, ledger: &Ledger) -> DomainResult<()> {
        fs::write(&self.path, ledger.render()).await?;
        Ok(())
    }
}
