//! Scripted mock agent for tests and dry runs.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, Mutex};

use crate::domain::errors::DomainResult;
use crate::domain::models::{AgentOutcome, Entry, COMPLETION_SENTINEL};
use crate::domain::ports::{AgentRunner, LedgerStore};

/// One scripted agent session.
#[derive(Debug, Clone, Default)]
pub struct MockStep {
    /// Flip the current (first pending) ledger entry to done.
    pub complete_current: bool,
    /// New entries to append to the ledger, as a discovery pass would.
    pub discover: Vec<Entry>,
    /// Incremental text emitted over the live channel.
    pub transcript: Option<String>,
    /// Terminal result text; `None` simulates a stream that closes without
    /// ever emitting a result record.
    pub result: Option<String>,
}

impl MockStep {
    /// Complete exactly one task and report it.
    pub fn complete_one() -> Self {
        Self {
            complete_current: true,
            result: Some("task completed and committed".to_string()),
            ..Self::default()
        }
    }

    /// Touch nothing and declare the ledger drained.
    pub fn sentinel() -> Self {
        Self {
            result: Some(format!("no eligible work remains. {COMPLETION_SENTINEL}")),
            ..Self::default()
        }
    }

    /// Stream closes without a terminal record.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Touch nothing, return an ordinary result.
    pub fn idle() -> Self {
        Self {
            result: Some("no changes made".to_string()),
            ..Self::default()
        }
    }

    pub fn with_discover(mut self, entries: Vec<Entry>) -> Self {
        self.discover = entries;
        self
    }
}

/// Deterministic [`AgentRunner`] that replays scripted steps and drives the
/// ledger through the same model operations a real agent session would cause.
/// Backs `--dry-run` and the loop's integration tests.
pub struct MockAgent {
    store: Option<Arc<dyn LedgerStore>>,
    steps: Mutex<VecDeque<MockStep>>,
    default_step: MockStep,
    payloads: Mutex<Vec<String>>,
}

impl MockAgent {
    /// A mock that never touches any ledger; every session returns the
    /// default idle result.
    pub fn detached() -> Self {
        Self {
            store: None,
            steps: Mutex::new(VecDeque::new()),
            default_step: MockStep::idle(),
            payloads: Mutex::new(Vec::new()),
        }
    }

    /// A mock whose scripted steps mutate the given ledger store.
    pub fn scripted(store: Arc<dyn LedgerStore>, steps: Vec<MockStep>) -> Self {
        Self {
            store: Some(store),
            steps: Mutex::new(steps.into()),
            default_step: MockStep::idle(),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_default_step(mut self, step: MockStep) -> Self {
        self.default_step = step;
        self
    }

    /// Payloads received so far, in invocation order.
    pub async fn payloads(&self) -> Vec<String> {
        self.payloads.lock().await.clone()
    }

    pub async fn invocation_count(&self) -> usize {
        self.payloads.lock().await.len()
    }
}

#[async_trait]
impl AgentRunner for MockAgent {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn invoke(
        &self,
        payload: &str,
        live: Option<mpsc::Sender<String>>,
    ) -> DomainResult<AgentOutcome> {
        let started_at = Utc::now();
        self.payloads.lock().await.push(payload.to_string());

        let step = self
            .steps
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.default_step.clone());

        if let Some(store) = &self.store {
            if step.complete_current || !step.discover.is_empty() {
                let mut ledger = store.load().await?;
                if step.complete_current {
                    if let Some((id, _)) = ledger.find_first_pending() {
                        ledger.mark_done(id);
                    }
                }
                if !step.discover.is_empty() {
                    ledger.insert_new(step.discover.clone());
                }
                store.save(&ledger).await?;
            }
        }

        let transcript = step.transcript.unwrap_or_default();
        if let (Some(tx), false) = (&live, transcript.is_empty()) {
            let _ = tx.send(transcript.clone()).await;
        }

        Ok(AgentOutcome::new(transcript, step.result, started_at))
    }
}
