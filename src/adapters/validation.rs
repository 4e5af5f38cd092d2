//! Validation collector: runs the external test and lint commands once per
//! iteration and reduces their raw output to a [`ValidationSnapshot`].
//!
//! Classification is token-driven and configured per tool; nothing here
//! understands the semantics of the code under test. A command falling over
//! is feedback for the agent, folded into the snapshot, never an error.

use std::process::Output;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::models::{
    LintClassifierConfig, TestClassifierConfig, ValidationConfig, ValidationSnapshot,
};

/// Runs the configured validation commands synchronously, with no internal
/// timeout: this component blocks for as long as the external tools run.
pub struct ValidationCollector {
    config: ValidationConfig,
}

impl ValidationCollector {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Execute the test command, then the lint command, and reduce both
    /// outputs into one snapshot.
    pub async fn run(&self) -> ValidationSnapshot {
        let mut snapshot = ValidationSnapshot::default();

        match capture(&self.config.test_command).await {
            Ok(output) => {
                let combined = combined_text(&output);
                classify_tests(
                    &combined,
                    &self.config.test,
                    self.config.max_detail_lines,
                    &mut snapshot,
                );
                // A non-zero exit with classified check lines is ordinary
                // failure feedback; without any, the tool itself broke.
                if !output.status.success()
                    && snapshot.tests_passed == 0
                    && snapshot.tests_failed == 0
                {
                    warn!(
                        command = %self.config.test_command.join(" "),
                        code = ?output.status.code(),
                        "test command produced no classifiable output"
                    );
                    snapshot.record_tool_error(format!(
                        "test command exited with {:?} and produced no check results",
                        output.status.code()
                    ));
                }
            }
            Err(message) => {
                warn!(error = %message, "test command failed to run");
                snapshot.record_tool_error(message);
            }
        }

        match capture(&self.config.lint_command).await {
            Ok(output) => {
                let combined = combined_text(&output);
                classify_lint(&combined, &self.config.lint, &mut snapshot);
                if !output.status.success()
                    && snapshot.lint_warnings == 0
                    && snapshot.lint_errors == 0
                {
                    snapshot.record_tool_error(format!(
                        "lint command exited with {:?} and produced no diagnostics",
                        output.status.code()
                    ));
                }
            }
            Err(message) => {
                warn!(error = %message, "lint command failed to run");
                snapshot.record_tool_error(message);
            }
        }

        debug!(
            passed = snapshot.tests_passed,
            failed = snapshot.tests_failed,
            warnings = snapshot.lint_warnings,
            errors = snapshot.lint_errors,
            tool_error = snapshot.tool_error.is_some(),
            "validation snapshot captured"
        );
        snapshot
    }
}

async fn capture(argv: &[String]) -> Result<Output, String> {
    let Some((program, args)) = argv.split_first() else {
        return Err("validation command is empty".to_string());
    };
    Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| format!("failed to run {program}: {e}"))
}

fn combined_text(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stderr);
    }
    text
}

/// Classify each line by its trailing status token; extract the trailing
/// summary line and, on failure, a literal detail tail.
fn classify_tests(
    output: &str,
    config: &TestClassifierConfig,
    max_detail_lines: usize,
    snapshot: &mut ValidationSnapshot,
) {
    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with(&config.summary_prefix) {
            snapshot.summary = Some(trimmed.to_string());
            continue;
        }
        let Some(last) = trimmed.split_whitespace().last() else {
            continue;
        };
        if last == config.fail_token {
            snapshot.tests_failed += 1;
            snapshot.failing.push(check_identifier(trimmed, last));
        } else if last == config.pass_token && trimmed != config.pass_token {
            snapshot.tests_passed += 1;
        }
    }

    if snapshot.tests_failed > 0 {
        let lines: Vec<&str> = output.lines().collect();
        let start = lines.len().saturating_sub(max_detail_lines);
        snapshot.failure_details = lines[start..].join("\n");
    }
}

/// Identifier of a failing check: the part before the ` ... ` separator,
/// minus a leading `test ` keyword when present.
fn check_identifier(line: &str, status_token: &str) -> String {
    let head = line
        .split_once(" ... ")
        .map_or_else(
            || line.trim_end_matches(status_token).trim_end(),
            |(head, _)| head,
        )
        .trim();
    head.strip_prefix("test ").unwrap_or(head).to_string()
}

/// Classify each line by its leading severity token; keep the first few
/// classified lines as the excerpt.
fn classify_lint(output: &str, config: &LintClassifierConfig, snapshot: &mut ValidationSnapshot) {
    let mut excerpt: Vec<&str> = Vec::new();
    for line in output.lines() {
        let trimmed = line.trim();
        let Some(head) = trimmed
            .split(|c: char| c == ':' || c == '[' || c.is_whitespace())
            .next()
        else {
            continue;
        };
        let severity = if head == config.warning_token {
            snapshot.lint_warnings += 1;
            true
        } else if head == config.error_token {
            snapshot.lint_errors += 1;
            true
        } else {
            false
        };
        if severity && excerpt.len() < config.excerpt_lines {
            excerpt.push(trimmed);
        }
    }
    snapshot.lint_excerpt = excerpt.join("\n");
}
