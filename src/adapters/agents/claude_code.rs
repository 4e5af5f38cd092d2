//! Claude Code CLI agent runner.
//!
//! Spawns one `claude` process per invocation, hands it the composed payload
//! on stdin, and consumes its stream-json output until the stream closes.

use std::process::Stdio;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AgentConfig, AgentOutcome};
use crate::domain::ports::AgentRunner;

/// One meaningful record of the agent's line-delimited output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AgentRecord {
    /// Incremental assistant text.
    Text(String),
    /// The terminal answer; expected exactly once per session.
    Result(String),
}

/// Subprocess-backed [`AgentRunner`] speaking the Claude Code CLI's
/// stream-json protocol.
pub struct ClaudeCodeAgent {
    config: AgentConfig,
}

impl ClaudeCodeAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "--print".to_string(),
            "--output-format".to_string(),
            "stream-json".to_string(),
        ];
        if let Some(model) = &self.config.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        args.extend(self.config.extra_flags.clone());
        args
    }

    /// Parse one stream line. JSON records are classified by their `type`
    /// field; unrecognized kinds are dropped. A non-JSON line is treated as
    /// plain incremental text.
    fn parse_record(line: &str) -> Option<AgentRecord> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.starts_with('{') {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
                let kind = json.get("type").and_then(|t| t.as_str())?;
                return match kind {
                    "text" | "assistant" | "content_block_delta" => {
                        let content = json
                            .get("content")
                            .or_else(|| json.get("text"))
                            .or_else(|| json.get("delta").and_then(|d| d.get("text")))
                            .and_then(|c| c.as_str())
                            .unwrap_or("");
                        if content.is_empty() {
                            None
                        } else {
                            Some(AgentRecord::Text(content.to_string()))
                        }
                    }
                    "result" => {
                        let result = json
                            .get("result")
                            .or_else(|| json.get("content"))
                            .map(|r| {
                                r.as_str()
                                    .map_or_else(|| r.to_string(), ToString::to_string)
                            })
                            .unwrap_or_default();
                        Some(AgentRecord::Result(result))
                    }
                    _ => None,
                };
            }
        }

        Some(AgentRecord::Text(line.to_string()))
    }
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[async_trait]
impl AgentRunner for ClaudeCodeAgent {
    fn name(&self) -> &'static str {
        "claude_code"
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.config.binary_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    async fn invoke(
        &self,
        payload: &str,
        live: Option<mpsc::Sender<String>>,
    ) -> DomainResult<AgentOutcome> {
        let started_at = Utc::now();

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.args(self.build_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            DomainError::AgentInvocation(format!(
                "failed to spawn {}: {e}",
                self.config.binary_path
            ))
        })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            DomainError::AgentInvocation("failed to open agent stdin".to_string())
        })?;
        stdin
            .write_all(payload.as_bytes())
            .await
            .map_err(|e| DomainError::AgentInvocation(format!("failed to write payload: {e}")))?;
        drop(stdin);

        let stdout = child.stdout.take().ok_or_else(|| {
            DomainError::AgentInvocation("failed to capture agent stdout".to_string())
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            DomainError::AgentInvocation("failed to capture agent stderr".to_string())
        })?;

        // Drain stderr concurrently so a chatty agent cannot deadlock on a
        // full pipe while we read stdout.
        let stderr_task = tokio::spawn(async move {
            let mut text = String::new();
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                text.push_str(&line);
                text.push('\n');
            }
            text
        });

        let mut transcript = String::new();
        let mut result: Option<String> = None;

        let mut lines = BufReader::new(stdout).lines();
        loop {
            let line = lines.next_line().await.map_err(|e| {
                DomainError::AgentInvocation(format!("agent stream read failed: {e}"))
            })?;
            let Some(line) = line else {
                break;
            };

            match Self::parse_record(&line) {
                Some(AgentRecord::Text(text)) => {
                    let chunk = normalize(&text);
                    transcript.push_str(&chunk);
                    if !chunk.ends_with('\n') {
                        transcript.push('\n');
                    }
                    if let Some(tx) = &live {
                        let _ = tx.send(chunk).await;
                    }
                }
                Some(AgentRecord::Result(text)) => {
                    if result.is_some() {
                        warn!("duplicate result record in agent stream ignored");
                    } else {
                        result = Some(normalize(&text));
                    }
                }
                None => {}
            }
        }

        let status = child.wait().await.map_err(|e| {
            DomainError::AgentInvocation(format!("failed to wait for agent process: {e}"))
        })?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            warn!(
                code = ?status.code(),
                stderr = %stderr_text.trim(),
                "agent process exited non-zero"
            );
        }
        debug!(
            transcript_bytes = transcript.len(),
            has_result = result.is_some(),
            "agent session finished"
        );

        Ok(AgentOutcome::new(transcript, result, started_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_defaults() {
        let agent = ClaudeCodeAgent::new(AgentConfig::default());
        let args = agent.build_args();
        assert!(args.contains(&"--print".to_string()));
        assert!(args.contains(&"stream-json".to_string()));
        assert!(!args.contains(&"--model".to_string()));
    }

    #[test]
    fn test_build_args_with_model_and_extra_flags() {
        let config = AgentConfig {
            model: Some("sonnet".to_string()),
            extra_flags: vec!["--max-turns".to_string(), "25".to_string()],
            ..AgentConfig::default()
        };
        let args = ClaudeCodeAgent::new(config).build_args();
        assert!(args.contains(&"--model".to_string()));
        assert!(args.contains(&"sonnet".to_string()));
        assert!(args.contains(&"--max-turns".to_string()));
    }

    #[test]
    fn test_parse_record_text() {
        let record = ClaudeCodeAgent::parse_record(r#"{"type":"text","text":"hello"}"#);
        assert_eq!(record, Some(AgentRecord::Text("hello".to_string())));
    }

    #[test]
    fn test_parse_record_result() {
        let record = ClaudeCodeAgent::parse_record(r#"{"type":"result","result":"done"}"#);
        assert_eq!(record, Some(AgentRecord::Result("done".to_string())));
    }

    #[test]
    fn test_parse_record_ignores_unknown_kinds() {
        assert_eq!(
            ClaudeCodeAgent::parse_record(r#"{"type":"tool_use","name":"Edit"}"#),
            None
        );
        assert_eq!(ClaudeCodeAgent::parse_record("   "), None);
    }

    #[test]
    fn test_parse_record_plain_text_fallback() {
        let record = ClaudeCodeAgent::parse_record("plain progress line");
        assert_eq!(
            record,
            Some(AgentRecord::Text("plain progress line".to_string()))
        );
    }

    /// Write an executable stand-in that ignores the fixed CLI flags, drains
    /// stdin, and replays the given stream-json body.
    #[cfg(unix)]
    fn scripted_agent(dir: &tempfile::TempDir, body: &str) -> ClaudeCodeAgent {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("fake-agent.sh");
        std::fs::write(&path, format!("#!/bin/sh\ncat > /dev/null\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        ClaudeCodeAgent::new(AgentConfig {
            binary_path: path.to_string_lossy().into_owned(),
            ..AgentConfig::default()
        })
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invoke_against_scripted_process() {
        let dir = tempfile::TempDir::new().unwrap();
        let agent = scripted_agent(
            &dir,
            concat!(
                r#"printf '{"type":"text","text":"working"}\n'"#,
                "\n",
                r#"printf '{"type":"result","result":"all done"}\n'"#
            ),
        );

        let outcome = agent.invoke("payload", None).await.unwrap();
        assert_eq!(outcome.transcript, "working\n");
        assert_eq!(outcome.result.as_deref(), Some("all done"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invoke_without_result_record() {
        let dir = tempfile::TempDir::new().unwrap();
        let agent =
            scripted_agent(&dir, r#"printf '{"type":"text","text":"partial"}\n'"#);

        let outcome = agent.invoke("payload", None).await.unwrap();
        assert!(outcome.result.is_none());
        assert!(outcome.transcript.contains("partial"));
    }

    #[tokio::test]
    async fn test_invoke_spawn_failure_is_fatal() {
        let agent = ClaudeCodeAgent::new(AgentConfig {
            binary_path: "definitely-not-a-real-binary-xyz".to_string(),
            ..AgentConfig::default()
        });
        let err = agent.invoke("payload", None).await.unwrap_err();
        assert!(matches!(err, DomainError::AgentInvocation(_)));
    }
}
