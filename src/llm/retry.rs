//! Shared exponential backoff retry logic for LLM providers.
//!
//! Retries live on the model collaborator, never in the refinement loop: a
//! model call that still fails after its own retries aborts the refinement.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::warn;

use crate::error::ModelError;

use super::model::LanguageModel;

/// Configuration: 3 total attempts, base 1s, max 30s.
pub const MAX_ATTEMPTS: u32 = 3;
const INITIAL_INTERVAL_SECS: u64 = 1;
const MAX_INTERVAL_SECS: u64 = 30;

/// Retry an async operation with exponential backoff.
///
/// `attempt` is called up to `MAX_ATTEMPTS` times. On each failure, the
/// returned error is stashed and the task sleeps for an exponentially
/// increasing duration before the next attempt.
///
/// `wrap_exhausted` converts the last error into the appropriate
/// `RetriesExhausted` variant for the caller's error type.
pub async fn retry_with_backoff<T, E, Fut, F, W>(
    mut attempt: F,
    wrap_exhausted: W,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    W: FnOnce(E) -> E,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: Duration::from_secs(INITIAL_INTERVAL_SECS),
        max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempts = 0;

    loop {
        attempts += 1;

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if attempts >= MAX_ATTEMPTS => return Err(wrap_exhausted(e)),
            Err(e) => {
                warn!("Attempt {}/{} failed: {}", attempts, MAX_ATTEMPTS, e);
                if let Some(wait_duration) = backoff.next_backoff() {
                    tokio::time::sleep(wait_duration).await;
                }
            }
        }
    }
}

/// A model wrapper that retries failed completions with backoff.
pub struct Retrying<M> {
    inner: M,
}

impl<M: LanguageModel> Retrying<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<M: LanguageModel> LanguageModel for Retrying<M> {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        retry_with_backoff(
            || self.inner.complete(prompt),
            |e| ModelError::RetriesExhausted(Box::new(e)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClaudeError;
    use crate::llm::model::MockLanguageModel;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient(String),
        RetriesExhausted(Box<TestError>),
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_on_first_attempt() {
        let result: Result<&str, TestError> =
            retry_with_backoff(|| async { Ok("ok") }, |e| TestError::RetriesExhausted(Box::new(e)))
                .await;
        assert_eq!(tokio_test::assert_ok!(result), "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_after_max_attempts() {
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = count.clone();

        let result: Result<(), TestError> = retry_with_backoff(
            move || {
                let c = count_clone.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Transient("fail".to_string()))
                }
            },
            |e| TestError::RetriesExhausted(Box::new(e)),
        )
        .await;

        assert!(matches!(result, Err(TestError::RetriesExhausted(_))));
        assert_eq!(count.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrying_model_recovers_after_transient_failure() {
        let mut mock = MockLanguageModel::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        mock.expect_complete().times(2).returning(move |_| {
            if calls_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ModelError::Claude(ClaudeError::ExecutionFailed("transient".to_string())))
            } else {
                Ok("[1]".to_string())
            }
        });

        let model = Retrying::new(mock);
        assert_eq!(model.complete("prompt").await.unwrap(), "[1]");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrying_model_preserves_last_error() {
        let mut mock = MockLanguageModel::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        mock.expect_complete().times(3).returning(move |_| {
            match calls_clone.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Err(ModelError::Claude(ClaudeError::ExecutionFailed("transient".to_string()))),
                _ => Err(ModelError::Claude(ClaudeError::ExecutionFailed("final".to_string()))),
            }
        });

        let result = Retrying::new(mock).complete("prompt").await;
        match result {
            Err(ModelError::RetriesExhausted(inner)) => {
                assert!(inner.to_string().contains("final"));
            }
            other => panic!("Expected RetriesExhausted, got {other:?}"),
        }
    }
}
