//! Completion and loop controller.
//!
//! Drives the iteration state machine: re-load the ledger, collect a fresh
//! validation snapshot, compose the payload, invoke the agent, inspect the
//! terminal result, and decide whether to continue. The loop performs at most
//! `budget` iterations for any agent behavior; it stops earlier only when the
//! ledger is drained before an iteration or the completion sentinel appears
//! after one.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::adapters::ValidationCollector;
use crate::application::composer;
use crate::domain::errors::DomainResult;
use crate::domain::models::{PromptConfig, RunMode, ValidationSnapshot};
use crate::domain::ports::{AgentRunner, LedgerStore};

/// Why the loop stopped. All three are normal terminations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCause {
    /// No pending entries remained at the top of an iteration.
    LedgerDrained,
    /// The agent's terminal result carried the completion sentinel.
    Sentinel,
    /// The iteration budget was spent.
    BudgetExhausted,
}

impl StopCause {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::LedgerDrained => "ledger exhausted",
            Self::Sentinel => "sentinel reached",
            Self::BudgetExhausted => "budget exhausted",
        }
    }
}

/// Progress events emitted while the loop runs.
#[derive(Debug, Clone)]
pub enum LoopEvent {
    Started {
        budget: u32,
        mode: RunMode,
        agent: &'static str,
    },
    IterationStarted {
        iteration: u32,
        budget: u32,
        section: String,
        task: String,
    },
    /// Live incremental text from the agent session.
    AgentText { chunk: String },
    IterationFinished {
        iteration: u32,
        completed: usize,
        remaining: usize,
        snapshot: ValidationSnapshot,
        no_result: bool,
    },
    Stopped { cause: StopCause },
}

/// Final report of one loop run.
#[derive(Debug, Clone, Serialize)]
pub struct LoopReport {
    pub iterations: u32,
    pub stop: StopCause,
    /// Entry counts as last observed at the top of an iteration.
    pub completed: usize,
    pub remaining: usize,
}

/// Top-level sequencer. Strictly single-flight: exactly one of ledger read,
/// validation run, compose, or agent session is active at any time.
pub struct LoopController {
    store: Arc<dyn LedgerStore>,
    collector: ValidationCollector,
    agent: Arc<dyn AgentRunner>,
    policy: PromptConfig,
    mode: RunMode,
    budget: u32,
}

impl LoopController {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        collector: ValidationCollector,
        agent: Arc<dyn AgentRunner>,
        policy: PromptConfig,
        mode: RunMode,
        budget: u32,
    ) -> Self {
        Self {
            store,
            collector,
            agent,
            policy,
            mode,
            budget,
        }
    }

    /// Run the loop to completion. Fatal errors (ledger parse, agent
    /// invocation, I/O) abort immediately; everything else is folded into
    /// the next iteration's inputs.
    pub async fn run(&self, events: mpsc::Sender<LoopEvent>) -> DomainResult<LoopReport> {
        let _ = events
            .send(LoopEvent::Started {
                budget: self.budget,
                mode: self.mode,
                agent: self.agent.name(),
            })
            .await;

        let mut iterations = 0u32;

        loop {
            // The agent mutates the ledger during its session, so it is
            // re-read fresh at the top of every iteration and never cached
            // across an invocation.
            let ledger = self.store.load().await?;
            let (completed, remaining) = ledger.counts();

            let Some((id, entry)) = ledger.find_first_pending() else {
                info!(completed, "ledger drained, stopping");
                let _ = events
                    .send(LoopEvent::Stopped {
                        cause: StopCause::LedgerDrained,
                    })
                    .await;
                return Ok(LoopReport {
                    iterations,
                    stop: StopCause::LedgerDrained,
                    completed,
                    remaining,
                });
            };
            let section_title = ledger.sections[id.section].title.clone();
            let current_task = entry.description.clone();

            iterations += 1;
            info!(
                iteration = iterations,
                budget = self.budget,
                task = %current_task,
                "iteration started"
            );
            let _ = events
                .send(LoopEvent::IterationStarted {
                    iteration: iterations,
                    budget: self.budget,
                    section: section_title.clone(),
                    task: current_task,
                })
                .await;

            let snapshot = self.collector.run().await;
            let payload =
                composer::compose(&self.policy, self.mode, &section_title, entry, &snapshot);

            // Forward live agent text onto the event channel.
            let (live_tx, mut live_rx) = mpsc::channel::<String>(64);
            let forward = events.clone();
            let forwarder = tokio::spawn(async move {
                while let Some(chunk) = live_rx.recv().await {
                    if forward.send(LoopEvent::AgentText { chunk }).await.is_err() {
                        break;
                    }
                }
            });

            let outcome = self.agent.invoke(&payload, Some(live_tx)).await?;
            let _ = forwarder.await;

            let no_result = outcome.result.is_none();
            if no_result {
                // Counts against the budget; otherwise behaves like "no
                // sentinel, continue".
                warn!(
                    iteration = iterations,
                    "agent stream closed without a terminal result record"
                );
            }

            let _ = events
                .send(LoopEvent::IterationFinished {
                    iteration: iterations,
                    completed,
                    remaining,
                    snapshot,
                    no_result,
                })
                .await;

            if outcome.sentinel_reached() {
                info!(iteration = iterations, "completion sentinel observed");
                let _ = events
                    .send(LoopEvent::Stopped {
                        cause: StopCause::Sentinel,
                    })
                    .await;
                return Ok(LoopReport {
                    iterations,
                    stop: StopCause::Sentinel,
                    completed,
                    remaining,
                });
            }

            if iterations >= self.budget {
                info!(budget = self.budget, "iteration budget exhausted");
                let _ = events
                    .send(LoopEvent::Stopped {
                        cause: StopCause::BudgetExhausted,
                    })
                    .await;
                return Ok(LoopReport {
                    iterations,
                    stop: StopCause::BudgetExhausted,
                    completed,
                    remaining,
                });
            }
        }
    }
}
