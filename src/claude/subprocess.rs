//! Claude CLI spawning.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ClaudeError;
use crate::llm::process::output_with_stdin;

/// Check if Claude Code CLI is installed and accessible.
///
/// Uses the `which` crate for cross-platform executable detection.
pub async fn check_claude_installed() -> Result<(), ClaudeError> {
    if which::which("claude").is_err() {
        return Err(ClaudeError::NotInstalled);
    }

    let version_check = Command::new("claude")
        .arg("--version")
        .output()
        .await
        .map_err(ClaudeError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(ClaudeError::NotInstalled);
    }

    Ok(())
}

/// Run Claude CLI with a prompt and return its stdout.
///
/// Uses `-p --output-format json`, plus `--model` when pinned. The prompt is
/// written to stdin. Returns `ClaudeError::Timeout` if `limit` elapses first.
pub async fn run_claude(
    program: &Path,
    prompt: &str,
    model: Option<&str>,
    limit: Duration,
) -> Result<String, ClaudeError> {
    let timeout_secs = limit.as_secs();

    let mut cmd = Command::new(program);
    cmd.arg("-p").arg("--output-format").arg("json");
    if let Some(model) = model {
        cmd.arg("--model").arg(model);
    }

    debug!(prompt_chars = prompt.chars().count(), "Spawning Claude CLI");

    let output = timeout(limit, output_with_stdin(cmd, prompt))
        .await
        .map_err(|_| ClaudeError::Timeout(timeout_secs))?
        .map_err(ClaudeError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(ClaudeError::NonZeroExit { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Claude CLI JSON envelope when using --output-format json
#[derive(serde::Deserialize)]
struct ClaudeCliResponse {
    result: String,
    #[serde(default)]
    is_error: bool,
}

/// Unwrap the CLI envelope into the model's text answer.
///
/// Output that is not an envelope is passed through unchanged.
pub fn parse_claude_envelope(stdout: &str) -> Result<String, ClaudeError> {
    match serde_json::from_str::<ClaudeCliResponse>(stdout) {
        Ok(envelope) if envelope.is_error => Err(ClaudeError::ExecutionFailed(envelope.result)),
        Ok(envelope) => Ok(envelope.result),
        Err(_) => Ok(stdout.to_string()),
    }
}
