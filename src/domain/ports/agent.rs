//! Agent runner port - interface to the opaque code-modifying agent.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::errors::DomainResult;
use crate::domain::models::AgentOutcome;

/// Capability interface over the external agent.
///
/// The agent is opaque and effectively nondeterministic: one payload in, one
/// streamed session out. There is one subprocess-backed implementation and
/// one deterministic scripted fake, so the loop's termination properties are
/// testable without a real process.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Implementation name, for logs and progress output.
    fn name(&self) -> &'static str;

    /// Whether the backing agent can be invoked at all.
    async fn is_available(&self) -> bool;

    /// Run one full agent session with `payload` as its sole instruction.
    ///
    /// Blocks until the session's output stream closes. Incremental text is
    /// forwarded over `live` as it arrives, for observability only; the
    /// returned outcome carries the complete transcript and the terminal
    /// result (`None` when the stream closed without one). Spawn and stream
    /// I/O failures are fatal and never retried here.
    async fn invoke(
        &self,
        payload: &str,
        live: Option<mpsc::Sender<String>>,
    ) -> DomainResult<AgentOutcome>;
}
