//! Codex CLI spawning.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::CodexError;
use crate::llm::process::output_with_stdin;

/// Check if Codex CLI is installed and accessible.
pub async fn check_codex_installed() -> Result<(), CodexError> {
    if which::which("codex").is_err() {
        return Err(CodexError::NotInstalled);
    }

    let version_check = Command::new("codex")
        .arg("--version")
        .output()
        .await
        .map_err(CodexError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(CodexError::NotInstalled);
    }

    Ok(())
}

/// Run `codex exec [--model <model>] -` with the prompt on stdin and return
/// the free-form text response.
pub async fn run_codex(
    program: &Path,
    prompt: &str,
    model: Option<&str>,
    limit: Duration,
) -> Result<String, CodexError> {
    let timeout_secs = limit.as_secs();

    let mut cmd = Command::new(program);
    cmd.arg("exec");
    if let Some(model) = model {
        cmd.arg("--model").arg(model);
    }
    // "-" makes codex read the prompt from stdin.
    cmd.arg("-");

    debug!(prompt_chars = prompt.chars().count(), "Spawning Codex CLI");

    let output = timeout(limit, output_with_stdin(cmd, prompt))
        .await
        .map_err(|_| CodexError::Timeout(timeout_secs))?
        .map_err(CodexError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(CodexError::NonZeroExit { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
