//! Provider selection and fallback orchestration.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::warn;

use crate::error::ModelError;

use super::model::LanguageModel;

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Claude,
    Codex,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Claude => "Claude",
            Provider::Codex => "Codex",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Ok(Provider::Claude),
            "codex" => Ok(Provider::Codex),
            other => Err(format!("unknown provider '{other}' (expected claude or codex)")),
        }
    }
}

/// Primary + fallback selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSelection {
    pub primary: Provider,
    pub fallback: Provider,
}

impl ProviderSelection {
    pub fn from_primary(primary: Provider) -> Self {
        let fallback = match primary {
            Provider::Claude => Provider::Codex,
            Provider::Codex => Provider::Claude,
        };
        Self { primary, fallback }
    }
}

impl Default for ProviderSelection {
    fn default() -> Self {
        ProviderSelection::from_primary(Provider::Claude)
    }
}

/// Two providers tried in order, with stickiness: once the fallback succeeds
/// it becomes the primary for later calls.
///
/// The current order sits behind a mutex so a single instance can serve
/// concurrent refinements.
pub struct FallbackModel {
    claude: Box<dyn LanguageModel>,
    codex: Box<dyn LanguageModel>,
    selection: Mutex<ProviderSelection>,
}

impl FallbackModel {
    pub fn new(
        selection: ProviderSelection,
        claude: Box<dyn LanguageModel>,
        codex: Box<dyn LanguageModel>,
    ) -> Self {
        Self {
            claude,
            codex,
            selection: Mutex::new(selection),
        }
    }

    pub fn selection(&self) -> ProviderSelection {
        *self.selection.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn model(&self, provider: Provider) -> &dyn LanguageModel {
        match provider {
            Provider::Claude => self.claude.as_ref(),
            Provider::Codex => self.codex.as_ref(),
        }
    }

    fn promote(&self, provider: Provider) {
        let mut selection = self.selection.lock().unwrap_or_else(|e| e.into_inner());
        if selection.primary != provider {
            *selection = ProviderSelection::from_primary(provider);
        }
    }
}

#[async_trait]
impl LanguageModel for FallbackModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let ProviderSelection { primary, fallback } = self.selection();

        match self.model(primary).complete(prompt).await {
            Ok(output) => Ok(output),
            Err(primary_error) => {
                warn!("{} failed ({}), falling back to {}", primary, primary_error, fallback);
                match self.model(fallback).complete(prompt).await {
                    Ok(output) => {
                        self.promote(fallback);
                        Ok(output)
                    }
                    Err(fallback_error) => Err(ModelError::AllProvidersFailed {
                        primary,
                        primary_error: Box::new(primary_error),
                        fallback,
                        fallback_error: Box::new(fallback_error),
                    }),
                }
            }
        }
    }
}
