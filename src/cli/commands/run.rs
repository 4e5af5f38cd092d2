//! The single driver command: wire the adapters together and run the loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::warn;

use crate::adapters::{ClaudeCodeAgent, FileLedgerStore, MockAgent, ValidationCollector};
use crate::application::{LoopController, LoopEvent, LoopReport};
use crate::cli::Cli;
use crate::domain::models::{RunMode, ValidationSnapshot};
use crate::domain::ports::AgentRunner;
use crate::infrastructure::ConfigLoader;

pub async fn execute(cli: Cli) -> Result<LoopReport> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let mode = RunMode::from(cli.mode);

    let store = Arc::new(FileLedgerStore::new(
        &config.ledger.path,
        config.ledger.blocking_headings.clone(),
    ));
    let collector = ValidationCollector::new(config.validation.clone());

    let agent: Arc<dyn AgentRunner> = if cli.dry_run {
        Arc::new(MockAgent::detached())
    } else {
        let agent = ClaudeCodeAgent::new(config.agent.clone());
        if !agent.is_available().await {
            warn!(
                binary = %config.agent.binary_path,
                "agent binary not available; the first invocation will fail"
            );
        }
        Arc::new(agent)
    };

    let controller = LoopController::new(
        store,
        collector,
        agent,
        config.prompt.clone(),
        mode,
        cli.budget,
    );

    let (event_tx, event_rx) = mpsc::channel::<LoopEvent>(100);
    let printer = tokio::spawn(print_events(event_rx, cli.json));

    let result = controller.run(event_tx).await;
    let _ = printer.await;

    result.context("loop run failed")
}

/// Consume loop events and print the per-iteration progress surface.
async fn print_events(mut events: mpsc::Receiver<LoopEvent>, json: bool) {
    while let Some(event) = events.recv().await {
        if json {
            print_json(&event);
        } else {
            print_text(&event);
        }
    }
}

fn print_text(event: &LoopEvent) {
    match event {
        LoopEvent::Started {
            budget,
            mode,
            agent,
        } => {
            println!("Starting ostinato loop");
            println!("   Budget: {budget} iterations");
            println!("   Mode:   {}", mode.as_str());
            println!("   Agent:  {agent}");
            println!();
        }
        LoopEvent::IterationStarted {
            iteration,
            budget,
            section,
            task,
        } => {
            println!("iteration {iteration}/{budget}: [{section}] {task}");
        }
        LoopEvent::AgentText { chunk } => {
            for line in chunk.lines() {
                println!("  | {line}");
            }
        }
        LoopEvent::IterationFinished {
            iteration,
            completed,
            remaining,
            snapshot,
            no_result,
        } => {
            let mut line = format!(
                "iteration {iteration}: {completed} completed, {remaining} remaining; \
checks: {} passed, {} failed",
                snapshot.tests_passed, snapshot.tests_failed
            );
            if snapshot.tool_error.is_some() {
                line.push_str(" (validation tooling failed)");
            }
            if *no_result {
                line.push_str(" (agent returned no result)");
            }
            println!("{line}");
        }
        LoopEvent::Stopped { cause } => {
            println!("stopped: {}", cause.describe());
        }
    }
}

fn print_json(event: &LoopEvent) {
    let line = match event {
        LoopEvent::Started {
            budget,
            mode,
            agent,
        } => serde_json::json!({
            "event": "started",
            "budget": budget,
            "mode": mode.as_str(),
            "agent": agent,
        }),
        LoopEvent::IterationStarted {
            iteration,
            budget,
            section,
            task,
        } => serde_json::json!({
            "event": "iteration_started",
            "iteration": iteration,
            "budget": budget,
            "section": section,
            "task": task,
        }),
        LoopEvent::AgentText { chunk } => serde_json::json!({
            "event": "agent_text",
            "text": chunk,
        }),
        LoopEvent::IterationFinished {
            iteration,
            completed,
            remaining,
            snapshot,
            no_result,
        } => iteration_json(*iteration, *completed, *remaining, snapshot, *no_result),
        LoopEvent::Stopped { cause } => serde_json::json!({
            "event": "stopped",
            "cause": cause,
            "description": cause.describe(),
        }),
    };
    println!("{line}");
}

fn iteration_json(
    iteration: u32,
    completed: usize,
    remaining: usize,
    snapshot: &ValidationSnapshot,
    no_result: bool,
) -> serde_json::Value {
    serde_json::json!({
        "event": "iteration_finished",
        "iteration": iteration,
        "completed": completed,
        "remaining": remaining,
        "tests_passed": snapshot.tests_passed,
        "tests_failed": snapshot.tests_failed,
        "lint_warnings": snapshot.lint_warnings,
        "lint_errors": snapshot.lint_errors,
        "tool_error": snapshot.tool_error,
        "no_result": no_result,
    })
}
