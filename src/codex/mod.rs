//! Codex CLI integration.

pub mod subprocess;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ModelError;
use crate::llm::LanguageModel;

pub use subprocess::{check_codex_installed, run_codex};

/// Codex CLI (`codex exec`) as a [`LanguageModel`].
#[derive(Debug, Clone)]
pub struct CodexModel {
    program: PathBuf,
    model: Option<String>,
    timeout: Duration,
}

impl CodexModel {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: PathBuf::from("codex"),
            model: None,
            timeout,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl LanguageModel for CodexModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        Ok(run_codex(&self.program, prompt, self.model.as_deref(), self.timeout).await?)
    }
}
