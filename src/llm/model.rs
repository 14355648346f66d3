//! The language model seam.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ModelError;

/// A text-in, text-out generative model.
///
/// Implementations must be safe to share between concurrent refinements:
/// either stateless or internally synchronized.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt`. An empty completion is a valid answer.
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

#[async_trait]
impl<M: LanguageModel + ?Sized> LanguageModel for Arc<M> {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        (**self).complete(prompt).await
    }
}

#[async_trait]
impl<M: LanguageModel + ?Sized> LanguageModel for Box<M> {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        (**self).complete(prompt).await
    }
}
