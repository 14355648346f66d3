//! Subprocess plumbing shared by the provider CLIs.

use std::io;
use std::process::{Output, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Spawn `cmd`, feed `input` to its stdin and collect its output.
///
/// Prompts go through stdin because a single argv element is capped at
/// 128 KiB on Linux. The child is killed if the returned future is dropped.
pub(crate) async fn output_with_stdin(mut cmd: Command, input: &str) -> io::Result<Output> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn()?;
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| io::Error::other("child stdin was not captured"))?;

    // Written concurrently with reading stdout so neither pipe can fill up.
    let input = input.as_bytes().to_vec();
    let writer = tokio::spawn(async move {
        if let Err(e) = stdin.write_all(&input).await {
            // The child may exit without consuming all of its input.
            debug!("Stopped writing prompt to child stdin: {}", e);
        }
    });

    let output = child.wait_with_output().await?;
    if let Err(e) = writer.await {
        debug!("Prompt writer task failed: {}", e);
    }
    Ok(output)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_input_reaches_child_stdin() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("cat");
        let output = output_with_stdin(cmd, "hello over stdin").await.unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "hello over stdin");
    }

    #[tokio::test]
    async fn test_child_ignoring_stdin_still_completes() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo done");
        let input = "x".repeat(1024 * 1024);
        let output = output_with_stdin(cmd, &input).await.unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "done");
    }
}
