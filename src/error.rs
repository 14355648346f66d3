//! Error types for pricewise modules using thiserror.

use thiserror::Error;

use crate::llm::Provider;
use crate::refine::Role;

/// Errors from prompt template parsing and rendering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template '{template}' references unbound placeholder '{{{placeholder}}}'")]
    MissingBinding {
        template: String,
        placeholder: String,
    },

    #[error("Template '{template}' is malformed at byte {position}: {reason}")]
    Malformed {
        template: String,
        position: usize,
        reason: &'static str,
    },
}

impl TemplateError {
    /// The unresolved placeholder name, if this is a missing binding.
    pub fn missing_placeholder(&self) -> Option<&str> {
        match self {
            TemplateError::MissingBinding { placeholder, .. } => Some(placeholder),
            TemplateError::Malformed { .. } => None,
        }
    }
}

/// Errors from Claude CLI operations.
#[derive(Error, Debug)]
pub enum ClaudeError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Claude Code CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Claude process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Claude CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Errors from Codex CLI operations.
#[derive(Error, Debug)]
pub enum CodexError {
    #[error(
        "Codex CLI not found. Install with: npm install -g @openai/codex (then run `codex` or set CODEX_API_KEY)"
    )]
    NotInstalled,

    #[error("Failed to spawn Codex process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Codex process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Codex CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Errors from a language model invocation.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error(transparent)]
    Claude(#[from] ClaudeError),

    #[error(transparent)]
    Codex(#[from] CodexError),

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<ModelError>),

    #[error("Both LLM providers failed. {primary} error: {primary_error}. {fallback} error: {fallback_error}.")]
    AllProvidersFailed {
        primary: Provider,
        primary_error: Box<ModelError>,
        fallback: Provider,
        fallback_error: Box<ModelError>,
    },
}

/// Errors that abort a refinement invocation.
///
/// Extraction failures never appear here; they travel forward as diagnostic
/// values inside the result.
#[derive(Error, Debug)]
pub enum RefineError {
    #[error("{role} model call failed at iteration {iteration}: {source}")]
    ModelInvocation {
        iteration: usize,
        role: Role,
        #[source]
        source: ModelError,
    },

    #[error("Failed to render {role} prompt at iteration {iteration}: {source}")]
    Render {
        iteration: usize,
        role: Role,
        #[source]
        source: TemplateError,
    },
}

impl RefineError {
    /// 1-based iteration at which the refinement was aborted.
    pub fn iteration(&self) -> usize {
        match self {
            RefineError::ModelInvocation { iteration, .. } | RefineError::Render { iteration, .. } => {
                *iteration
            }
        }
    }
}

/// Errors from the web search collaborator.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("BRAVE_SEARCH_KEY is not set. Get a free API key at https://brave.com/search/api/")]
    MissingApiKey,

    #[error("Search request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Search API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Errors surfaced by the pricing and forecast use cases.
#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("Invalid date format '{0}'. Use YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("End date {end} is before start date {start}")]
    InvalidDateRange { start: String, end: String },

    #[error("Failed to build prompt template: {0}")]
    Template(#[from] TemplateError),

    #[error("Failed to serialize prompt data: {0}")]
    SerializationFailed(#[source] serde_json::Error),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Refine(#[from] RefineError),

    #[error("Refinement did not finish within {0} seconds")]
    TimedOut(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binding_names_placeholder() {
        let err = TemplateError::MissingBinding {
            template: "expert".to_string(),
            placeholder: "raw_text".to_string(),
        };
        assert_eq!(err.missing_placeholder(), Some("raw_text"));
        assert!(err.to_string().contains("{raw_text}"));
    }

    #[test]
    fn refine_error_carries_iteration() {
        let err = RefineError::ModelInvocation {
            iteration: 2,
            role: Role::Reviewer,
            source: ModelError::Claude(ClaudeError::ExecutionFailed("quota".to_string())),
        };
        assert_eq!(err.iteration(), 2);
        assert!(err.to_string().contains("reviewer model call failed at iteration 2"));
    }
}
