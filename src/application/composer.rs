//! Prompt composer.
//!
//! Pure string construction: identical inputs yield a byte-identical payload.
//! No I/O happens here; everything variable arrives as an argument.

use std::fmt::Write as _;

use crate::domain::models::{
    Entry, PromptConfig, RunMode, ValidationSnapshot, COMPLETION_SENTINEL,
};

/// Build the full instruction payload for one agent session.
pub fn compose(
    policy: &PromptConfig,
    mode: RunMode,
    section_title: &str,
    entry: &Entry,
    snapshot: &ValidationSnapshot,
) -> String {
    let mut payload = String::new();

    payload.push_str(policy.header.trim());
    payload.push_str("\n\n");

    if !policy.doc_refs.is_empty() {
        payload.push_str("## Reference documents\n\nRead these before acting:\n");
        for doc in &policy.doc_refs {
            let _ = writeln!(payload, "- {doc}");
        }
        payload.push('\n');
    }

    let _ = writeln!(payload, "## Workflow: {}\n", mode.as_str());
    match mode {
        RunMode::Discover => {
            payload.push_str(
                "This is an observe-only discovery pass. Survey the codebase and the \
test suite, and record any missing or broken behavior you find as new \
unchecked entries in the task ledger, in the blocking section. Do NOT \
modify source code, tests, or build files, and do not commit anything.\n\n",
            );
        }
        RunMode::Implement => {
            payload.push_str(
                "Implement exactly the one current task below and nothing else. Leave \
every other ledger entry untouched. When the change is complete, mark the \
task's checkbox done, re-run the checks, and create exactly one commit whose \
message references the task. Never record yourself as the commit author or a \
co-author; commit under the repository's configured identity.\n\n",
            );
        }
    }

    payload.push_str("## Current task\n\n");
    let _ = writeln!(payload, "Section: {section_title}");
    let mut line = String::new();
    if let Some(category) = &entry.category {
        let _ = write!(line, "[{}] ", category.as_tag());
    }
    line.push_str(&entry.description);
    if let Some(source) = &entry.source {
        let _ = write!(line, " ({source})");
    }
    let _ = writeln!(payload, "Task: {line}");
    for note in &entry.notes {
        let _ = writeln!(payload, "  - {note}");
    }
    payload.push('\n');

    payload.push_str("## Latest validation\n\n");
    write_snapshot(&mut payload, snapshot);
    payload.push('\n');

    let _ = writeln!(
        payload,
        "## Completion\n\nWhen the ledger holds no further eligible work, include the \
marker {COMPLETION_SENTINEL} in your final reply. Otherwise end your reply \
with a one-line summary of what you changed."
    );

    payload
}

fn write_snapshot(payload: &mut String, snapshot: &ValidationSnapshot) {
    if let Some(tool_error) = &snapshot.tool_error {
        let _ = writeln!(
            payload,
            "Validation tooling failed, treat results as unknown: {tool_error}"
        );
    }
    let _ = writeln!(
        payload,
        "Tests: {} passed, {} failed.",
        snapshot.tests_passed, snapshot.tests_failed
    );
    if !snapshot.failing.is_empty() {
        let _ = writeln!(payload, "Failing checks: {}", snapshot.failing.join(", "));
    }
    if let Some(summary) = &snapshot.summary {
        let _ = writeln!(payload, "Summary: {summary}");
    }
    if !snapshot.failure_details.is_empty() {
        let _ = writeln!(payload, "Failure detail:\n{}", snapshot.failure_details);
    }
    let _ = writeln!(
        payload,
        "Lint: {} warnings, {} errors.",
        snapshot.lint_warnings, snapshot.lint_errors
    );
    if !snapshot.lint_excerpt.is_empty() {
        let _ = writeln!(payload, "Lint excerpt:\n{}", snapshot.lint_excerpt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Category;

    fn sample_inputs() -> (PromptConfig, Entry, ValidationSnapshot) {
        let policy = PromptConfig {
            header: "You are the maintenance engineer.".to_string(),
            doc_refs: vec!["ARCHITECTURE.md".to_string(), "CONTRIBUTING.md".to_string()],
        };
        let entry = Entry::pending("Fix tie direction in second voice")
            .with_category(Category::Bug)
            .with_source("roundtrip_ties");
        let snapshot = ValidationSnapshot {
            tests_passed: 12,
            tests_failed: 1,
            failing: vec!["parser::grace_notes".to_string()],
            summary: Some("test result: FAILED. 12 passed; 1 failed".to_string()),
            ..ValidationSnapshot::default()
        };
        (policy, entry, snapshot)
    }

    #[test]
    fn test_compose_is_deterministic() {
        let (policy, entry, snapshot) = sample_inputs();
        let first = compose(&policy, RunMode::Implement, "Blocking", &entry, &snapshot);
        let second = compose(&policy, RunMode::Implement, "Blocking", &entry, &snapshot);
        assert_eq!(first, second);
    }

    #[test]
    fn test_compose_embeds_all_parts() {
        let (policy, entry, snapshot) = sample_inputs();
        let payload = compose(&policy, RunMode::Implement, "Blocking", &entry, &snapshot);

        assert!(payload.starts_with("You are the maintenance engineer."));
        assert!(payload.contains("- ARCHITECTURE.md"));
        assert!(payload.contains("Section: Blocking"));
        assert!(payload.contains("[bug] Fix tie direction in second voice (roundtrip_ties)"));
        assert!(payload.contains("Tests: 12 passed, 1 failed."));
        assert!(payload.contains("Failing checks: parser::grace_notes"));
        assert!(payload.contains(COMPLETION_SENTINEL));
    }

    #[test]
    fn test_modes_produce_distinct_instructions() {
        let (policy, entry, snapshot) = sample_inputs();
        let discover = compose(&policy, RunMode::Discover, "Parser", &entry, &snapshot);
        let implement = compose(&policy, RunMode::Implement, "Parser", &entry, &snapshot);

        assert_ne!(discover, implement);
        assert!(discover.contains("observe-only discovery pass"));
        assert!(discover.contains("Do NOT"));
        assert!(implement.contains("exactly one commit"));
    }

    #[test]
    fn test_tool_error_is_surfaced() {
        let (policy, entry, _) = sample_inputs();
        let snapshot = ValidationSnapshot::tool_failure("test command exited with Some(3)");
        let payload = compose(&policy, RunMode::Implement, "Parser", &entry, &snapshot);
        assert!(payload.contains("Validation tooling failed"));
        assert!(payload.contains("Tests: 0 passed, 0 failed."));
    }
}
