//! Claude CLI integration.

pub mod subprocess;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ModelError;
use crate::llm::LanguageModel;

pub use subprocess::{check_claude_installed, parse_claude_envelope, run_claude};

/// Claude Code CLI as a [`LanguageModel`].
#[derive(Debug, Clone)]
pub struct ClaudeModel {
    program: PathBuf,
    model: Option<String>,
    timeout: Duration,
}

impl ClaudeModel {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: PathBuf::from("claude"),
            model: None,
            timeout,
        }
    }

    /// Pin a model name (`--model`).
    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Use a different executable, e.g. a wrapper script.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl LanguageModel for ClaudeModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let stdout = run_claude(&self.program, prompt, self.model.as_deref(), self.timeout).await?;
        Ok(parse_claude_envelope(&stdout)?)
    }
}
