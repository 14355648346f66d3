//! Runtime configuration from environment variables.
//!
//! Every setting has a default. A variable that is set but cannot be parsed
//! is logged and ignored rather than treated as fatal.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::llm::Provider;
use crate::refine::DEFAULT_MAX_ITERATIONS;

/// Primary model provider (`claude` or `codex`).
pub const PROVIDER_ENV_VAR: &str = "PRICEWISE_PROVIDER";
/// Model name passed to the provider CLI.
pub const MODEL_ENV_VAR: &str = "PRICEWISE_MODEL";
/// Per model call timeout, in seconds.
pub const MODEL_TIMEOUT_ENV_VAR: &str = "PRICEWISE_MODEL_TIMEOUT";
/// Refinement iteration budget.
pub const MAX_ITERATIONS_ENV_VAR: &str = "PRICEWISE_MAX_ITERATIONS";
/// Deadline for a whole use-case invocation, in seconds.
pub const REFINE_TIMEOUT_ENV_VAR: &str = "PRICEWISE_REFINE_TIMEOUT";
/// Number of search results to scrape.
pub const SEARCH_RESULTS_ENV_VAR: &str = "PRICEWISE_SEARCH_RESULTS";
/// Brave Search API key.
pub const BRAVE_KEY_ENV_VAR: &str = "BRAVE_SEARCH_KEY";

/// Default timeout for a single model call (5 minutes).
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 300;
const DEFAULT_SEARCH_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub provider: Provider,
    pub model: Option<String>,
    pub model_timeout: Duration,
    pub max_iterations: usize,
    /// `None` means no deadline.
    pub refine_timeout: Option<Duration>,
    pub search_results: usize,
    pub brave_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::Claude,
            model: None,
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            refine_timeout: None,
            search_results: DEFAULT_SEARCH_RESULTS,
            brave_api_key: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Self {
            provider: parse_var(PROVIDER_ENV_VAR, defaults.provider),
            model: non_empty_var(MODEL_ENV_VAR),
            model_timeout: Duration::from_secs(parse_var(
                MODEL_TIMEOUT_ENV_VAR,
                DEFAULT_MODEL_TIMEOUT_SECS,
            )),
            max_iterations: parse_var(MAX_ITERATIONS_ENV_VAR, defaults.max_iterations),
            refine_timeout: non_empty_var(REFINE_TIMEOUT_ENV_VAR)
                .and_then(|v| parse_value(REFINE_TIMEOUT_ENV_VAR, &v))
                .map(Duration::from_secs),
            search_results: parse_var(SEARCH_RESULTS_ENV_VAR, defaults.search_results),
            brave_api_key: non_empty_var(BRAVE_KEY_ENV_VAR),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_value<T>(name: &str, raw: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Invalid {} value '{}' ({}), using default", name, raw, e);
            None
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    non_empty_var(name)
        .and_then(|raw| parse_value(name, &raw))
        .unwrap_or(default)
}
