//! Agent session models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed marker the agent includes in its terminal result when the ledger
/// holds no further eligible work. Its presence short-circuits the loop
/// regardless of actual ledger state.
pub const COMPLETION_SENTINEL: &str = "ALL_TASKS_COMPLETE";

/// Workflow mode given to the agent for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Survey the codebase and record new ledger entries; never edit code.
    Discover,
    /// Edit code for exactly one current task and commit it.
    Implement,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discover => "discover",
            Self::Implement => "implement",
        }
    }
}

/// Terminal state of one agent session: the concatenated, newline-normalized
/// incremental text and the terminal result, if one was ever emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub session_id: Uuid,
    pub transcript: String,
    /// Text of the single `result` record. `None` when the stream closed
    /// without one — "no progress this iteration", not a hard failure.
    pub result: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl AgentOutcome {
    pub fn new(transcript: String, result: Option<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            transcript,
            result,
            started_at,
            ended_at: Utc::now(),
        }
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.ended_at - self.started_at).num_seconds()
    }

    /// Whether the terminal result carries the completion sentinel.
    pub fn sentinel_reached(&self) -> bool {
        self.result
            .as_deref()
            .is_some_and(|r| r.contains(COMPLETION_SENTINEL))
    }
}
