//! Domain errors for the ostinato loop driver.

use thiserror::Error;

/// Domain-level errors. Only fatal conditions live here: a validation tool
/// falling over is folded into the snapshot, and an agent session that ends
/// without a terminal record is an ordinary outcome, not an error.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("ledger parse failed: {0}")]
    LedgerParse(String),

    #[error("agent invocation failed: {0}")]
    AgentInvocation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DomainError {
    /// Short stable kind label used in the final `stopped: fatal error (...)`
    /// diagnostic line.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LedgerParse(_) => "ledger_parse",
            Self::AgentInvocation(_) => "agent_invocation",
            Self::Io(_) => "io",
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(DomainError::LedgerParse("x".into()).kind(), "ledger_parse");
        assert_eq!(
            DomainError::AgentInvocation("x".into()).kind(),
            "agent_invocation"
        );
    }
}
