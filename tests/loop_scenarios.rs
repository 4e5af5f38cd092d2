//! End-to-end loop behavior against the scripted mock agent.

use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::mpsc;

use ostinato::application::{LoopController, LoopEvent, StopCause};
use ostinato::domain::models::{PromptConfig, RunMode, ValidationConfig};
use ostinato::{FileLedgerStore, LedgerStore, LoopReport, MockAgent, MockStep, ValidationCollector};

fn file_store(dir: &TempDir, doc: &str) -> Arc<FileLedgerStore> {
    let path = dir.path().join("TODO.md");
    std::fs::write(&path, doc).unwrap();
    Arc::new(FileLedgerStore::new(
        path,
        vec!["Blocking".to_string(), "Blockers".to_string()],
    ))
}

/// Validation commands that always produce one passing check.
fn green_validation() -> ValidationConfig {
    ValidationConfig {
        test_command: vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf 'test smoke ... ok\\ntest result: ok. 1 passed; 0 failed\\n'".to_string(),
        ],
        lint_command: vec!["sh".to_string(), "-c".to_string(), "true".to_string()],
        ..ValidationConfig::default()
    }
}

/// Test command that exits non-zero without any output.
fn broken_validation() -> ValidationConfig {
    ValidationConfig {
        test_command: vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()],
        lint_command: vec!["sh".to_string(), "-c".to_string(), "true".to_string()],
        ..ValidationConfig::default()
    }
}

async fn run_loop(
    store: Arc<FileLedgerStore>,
    agent: Arc<MockAgent>,
    validation: ValidationConfig,
    mode: RunMode,
    budget: u32,
) -> (LoopReport, Vec<LoopEvent>) {
    let controller = LoopController::new(
        store,
        ValidationCollector::new(validation),
        agent,
        PromptConfig::default(),
        mode,
        budget,
    );

    let (tx, mut rx) = mpsc::channel::<LoopEvent>(100);
    let drain = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    });

    let report = controller.run(tx).await.unwrap();
    let events = drain.await.unwrap();
    (report, events)
}

#[tokio::test]
async fn scenario_ledger_drains_before_budget() {
    // Three pending entries, budget five; the agent flips exactly one entry
    // per call and never emits the sentinel.
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir, "- [ ] first\n- [ ] second\n- [ ] third\n");
    let agent = Arc::new(MockAgent::scripted(
        store.clone(),
        vec![
            MockStep::complete_one(),
            MockStep::complete_one(),
            MockStep::complete_one(),
        ],
    ));

    let (report, _) = run_loop(
        store.clone(),
        agent.clone(),
        green_validation(),
        RunMode::Implement,
        5,
    )
    .await;

    assert_eq!(report.iterations, 3);
    assert_eq!(report.stop, StopCause::LedgerDrained);
    assert_eq!(report.remaining, 0);
    assert_eq!(report.completed, 3);
    assert_eq!(agent.invocation_count().await, 3);
    assert_eq!(store.load().await.unwrap().counts(), (3, 0));
}

#[tokio::test]
async fn scenario_sentinel_short_circuits_regardless_of_ledger_state() {
    // One pending entry, budget one; the agent emits the sentinel without
    // touching the ledger.
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir, "- [ ] untouched task\n");
    let agent = Arc::new(MockAgent::scripted(store.clone(), vec![MockStep::sentinel()]));

    let (report, _) = run_loop(
        store.clone(),
        agent,
        green_validation(),
        RunMode::Implement,
        1,
    )
    .await;

    assert_eq!(report.iterations, 1);
    assert_eq!(report.stop, StopCause::Sentinel);
    // The entry is still pending; the sentinel wins over ledger state.
    assert_eq!(store.load().await.unwrap().counts(), (0, 1));
}

#[tokio::test]
async fn scenario_validation_tool_failure_does_not_abort() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir, "- [ ] task\n");
    let agent = Arc::new(MockAgent::scripted(store.clone(), vec![MockStep::idle()]));

    let (report, _) = run_loop(
        store,
        agent.clone(),
        broken_validation(),
        RunMode::Implement,
        1,
    )
    .await;

    // The loop proceeded to compose and invoke rather than aborting, and the
    // agent saw the tool-failure annotation instead of counts.
    assert_eq!(report.iterations, 1);
    assert_eq!(report.stop, StopCause::BudgetExhausted);
    let payloads = agent.payloads().await;
    assert_eq!(payloads.len(), 1);
    assert!(payloads[0].contains("Validation tooling failed"));
    assert!(payloads[0].contains("Tests: 0 passed, 0 failed."));
}

#[tokio::test]
async fn scenario_missing_result_consumes_budget_and_continues() {
    // First session's stream closes without a terminal record; the loop
    // counts the iteration and moves on.
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir, "- [ ] task\n");
    let agent = Arc::new(MockAgent::scripted(
        store.clone(),
        vec![MockStep::silent(), MockStep::complete_one()],
    ));

    let (report, events) = run_loop(
        store.clone(),
        agent.clone(),
        green_validation(),
        RunMode::Implement,
        3,
    )
    .await;

    assert_eq!(agent.invocation_count().await, 2);
    assert_eq!(report.iterations, 2);
    assert_eq!(report.stop, StopCause::LedgerDrained);

    let no_result_flags: Vec<bool> = events
        .iter()
        .filter_map(|e| match e {
            LoopEvent::IterationFinished { no_result, .. } => Some(*no_result),
            _ => None,
        })
        .collect();
    assert_eq!(no_result_flags, vec![true, false]);
}

#[tokio::test]
async fn scenario_blocking_section_wins_over_earlier_sections() {
    // A blocking section declared after a non-blocking one still takes
    // precedence.
    let dir = TempDir::new().unwrap();
    let store = file_store(
        &dir,
        "## Parser\n\
         - [ ] one\n\
         - [ ] two\n\
         - [ ] three\n\
         - [ ] four\n\
         - [ ] five\n\
         \n\
         ## Blocking\n\
         - [ ] urgent fix\n",
    );
    let agent = Arc::new(MockAgent::scripted(
        store.clone(),
        vec![MockStep::complete_one()],
    ));

    let (report, events) = run_loop(
        store.clone(),
        agent,
        green_validation(),
        RunMode::Implement,
        1,
    )
    .await;

    assert_eq!(report.iterations, 1);
    let first_task = events.iter().find_map(|e| match e {
        LoopEvent::IterationStarted { task, section, .. } => {
            Some((task.clone(), section.clone()))
        }
        _ => None,
    });
    assert_eq!(
        first_task,
        Some(("urgent fix".to_string(), "Blocking".to_string()))
    );

    let ledger = store.load().await.unwrap();
    // The blocking entry was completed; all five parser entries remain.
    assert_eq!(ledger.sections[1].entries[0].description, "urgent fix");
    assert!(!ledger.sections[1].entries[0].is_pending());
    assert_eq!(ledger.counts(), (1, 5));
}

#[tokio::test]
async fn loop_never_exceeds_budget_for_an_unproductive_agent() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir, "- [ ] never done\n");
    // Default step: touch nothing, ordinary result, no sentinel.
    let agent = Arc::new(MockAgent::scripted(store.clone(), Vec::new()));

    let (report, _) = run_loop(
        store,
        agent.clone(),
        green_validation(),
        RunMode::Implement,
        4,
    )
    .await;

    assert_eq!(report.iterations, 4);
    assert_eq!(report.stop, StopCause::BudgetExhausted);
    assert_eq!(agent.invocation_count().await, 4);
}

#[tokio::test]
async fn discover_mode_payload_carries_observe_only_instructions() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir, "- [ ] seed task\n");
    let agent = Arc::new(MockAgent::scripted(store.clone(), vec![MockStep::idle()]));

    run_loop(store, agent.clone(), green_validation(), RunMode::Discover, 1).await;

    let payloads = agent.payloads().await;
    assert!(payloads[0].contains("observe-only discovery pass"));
    assert!(!payloads[0].contains("exactly one commit"));
}

#[tokio::test]
async fn snapshot_counts_reach_the_payload() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir, "- [ ] task\n");
    let agent = Arc::new(MockAgent::scripted(store.clone(), vec![MockStep::idle()]));

    let validation = ValidationConfig {
        test_command: vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf 'test alpha ... ok\\ntest beta ... FAILED\\ntest result: FAILED. 1 passed; 1 failed\\n'"
                .to_string(),
        ],
        lint_command: vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf 'warning: dead code\\n'".to_string(),
        ],
        ..ValidationConfig::default()
    };

    run_loop(store, agent.clone(), validation, RunMode::Implement, 1).await;

    let payloads = agent.payloads().await;
    assert!(payloads[0].contains("Tests: 1 passed, 1 failed."));
    assert!(payloads[0].contains("Failing checks: beta"));
    assert!(payloads[0].contains("Lint: 1 warnings, 0 errors."));
}
