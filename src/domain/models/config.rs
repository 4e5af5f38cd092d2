//! Configuration tree for the loop driver.
//!
//! Everything tool-specific — validation commands, output classification
//! tokens, the agent binary, prompt policy text — is configuration, not code.

use serde::{Deserialize, Serialize};

/// Main configuration structure for ostinato.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Ledger document location and section semantics.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Validation command and classification configuration.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Agent subprocess configuration.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Prompt policy configuration.
    #[serde(default)]
    pub prompt: PromptConfig,
}

/// Ledger document configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerConfig {
    /// Path to the checklist document, relative to the working directory.
    #[serde(default = "default_ledger_path")]
    pub path: String,

    /// Headings whose sections take precedence over all others.
    #[serde(default = "default_blocking_headings")]
    pub blocking_headings: Vec<String>,
}

fn default_ledger_path() -> String {
    "TODO.md".to_string()
}

fn default_blocking_headings() -> Vec<String> {
    vec!["Blocking".to_string(), "Blockers".to_string()]
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
            blocking_headings: default_blocking_headings(),
        }
    }
}

/// Validation commands plus the per-tool output classification tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ValidationConfig {
    /// Test command argv. Expected to emit per-check lines with a trailing
    /// status token and a trailing summary line.
    #[serde(default = "default_test_command")]
    pub test_command: Vec<String>,

    /// Lint command argv. Expected to emit per-diagnostic lines with a
    /// leading severity token.
    #[serde(default = "default_lint_command")]
    pub lint_command: Vec<String>,

    /// Test output classification.
    #[serde(default)]
    pub test: TestClassifierConfig,

    /// Lint output classification.
    #[serde(default)]
    pub lint: LintClassifierConfig,

    /// Cap on literal failure-detail lines kept in the snapshot.
    #[serde(default = "default_max_detail_lines")]
    pub max_detail_lines: usize,
}

fn default_test_command() -> Vec<String> {
    vec![
        "cargo".to_string(),
        "test".to_string(),
        "--workspace".to_string(),
    ]
}

fn default_lint_command() -> Vec<String> {
    vec![
        "cargo".to_string(),
        "clippy".to_string(),
        "--workspace".to_string(),
        "--all-targets".to_string(),
    ]
}

const fn default_max_detail_lines() -> usize {
    40
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            test_command: default_test_command(),
            lint_command: default_lint_command(),
            test: TestClassifierConfig::default(),
            lint: LintClassifierConfig::default(),
            max_detail_lines: default_max_detail_lines(),
        }
    }
}

/// Trailing-token classification for the test command (cargo-test shaped
/// defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TestClassifierConfig {
    #[serde(default = "default_pass_token")]
    pub pass_token: String,

    #[serde(default = "default_fail_token")]
    pub fail_token: String,

    /// Prefix of the trailing summary line.
    #[serde(default = "default_summary_prefix")]
    pub summary_prefix: String,
}

fn default_pass_token() -> String {
    "ok".to_string()
}

fn default_fail_token() -> String {
    "FAILED".to_string()
}

fn default_summary_prefix() -> String {
    "test result:".to_string()
}

impl Default for TestClassifierConfig {
    fn default() -> Self {
        Self {
            pass_token: default_pass_token(),
            fail_token: default_fail_token(),
            summary_prefix: default_summary_prefix(),
        }
    }
}

/// Leading-token classification for the lint command (clippy shaped
/// defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LintClassifierConfig {
    #[serde(default = "default_warning_token")]
    pub warning_token: String,

    #[serde(default = "default_error_token")]
    pub error_token: String,

    /// How many classified lines to keep as the excerpt.
    #[serde(default = "default_excerpt_lines")]
    pub excerpt_lines: usize,
}

fn default_warning_token() -> String {
    "warning".to_string()
}

fn default_error_token() -> String {
    "error".to_string()
}

const fn default_excerpt_lines() -> usize {
    10
}

impl Default for LintClassifierConfig {
    fn default() -> Self {
        Self {
            warning_token: default_warning_token(),
            error_token: default_error_token(),
            excerpt_lines: default_excerpt_lines(),
        }
    }
}

/// Agent subprocess configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AgentConfig {
    /// Path to the agent CLI binary.
    #[serde(default = "default_agent_binary")]
    pub binary_path: String,

    /// Model to request, when the binary supports one.
    #[serde(default)]
    pub model: Option<String>,

    /// Extra CLI flags appended verbatim.
    #[serde(default)]
    pub extra_flags: Vec<String>,

    /// Working directory for the agent session (defaults to the driver's).
    #[serde(default)]
    pub working_dir: Option<String>,
}

fn default_agent_binary() -> String {
    "claude".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            binary_path: default_agent_binary(),
            model: None,
            extra_flags: Vec::new(),
            working_dir: None,
        }
    }
}

/// Static prompt policy: the header prepended to every payload and the
/// documents the agent is told to read first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PromptConfig {
    #[serde(default = "default_prompt_header")]
    pub header: String,

    /// Repository-relative documents referenced in every payload.
    #[serde(default)]
    pub doc_refs: Vec<String>,
}

fn default_prompt_header() -> String {
    "You are an autonomous engineer working through this repository's task \
ledger, one entry per session."
        .to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            header: default_prompt_header(),
            doc_refs: Vec::new(),
        }
    }
}
