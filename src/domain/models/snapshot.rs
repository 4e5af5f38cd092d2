//! Validation snapshot model.

use serde::{Deserialize, Serialize};

/// Reduced result of one validation pass (test command + lint command),
/// captured fresh each iteration and never reused across iterations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSnapshot {
    /// Checks whose status token classified as passing.
    pub tests_passed: u32,
    /// Checks whose status token classified as failing.
    pub tests_failed: u32,
    /// Identifiers of the failing checks, in output order.
    pub failing: Vec<String>,
    /// Literal tail of the test output when anything failed.
    pub failure_details: String,
    /// Trailing summary line of the test run, when one was found.
    pub summary: Option<String>,
    /// Lint diagnostics with a leading warning token.
    pub lint_warnings: u32,
    /// Lint diagnostics with a leading error token.
    pub lint_errors: u32,
    /// First few classified lint lines.
    pub lint_excerpt: String,
    /// Set when a validation command itself failed (could not spawn, or
    /// exited non-zero without a single classifiable line). Feedback for the
    /// agent, never a reason to abort the loop.
    pub tool_error: Option<String>,
}

impl ValidationSnapshot {
    /// Zero-count snapshot annotated with a tool failure.
    pub fn tool_failure(message: impl Into<String>) -> Self {
        Self {
            tool_error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn record_tool_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        match &mut self.tool_error {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(&message);
            }
            None => self.tool_error = Some(message),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.tests_failed == 0 && self.lint_errors == 0 && self.tool_error.is_none()
    }
}
