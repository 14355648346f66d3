//! LLM plumbing: model seam, provider routing, retries, prompts and JSON
//! extraction.

pub mod json;
pub mod model;
pub(crate) mod process;
pub mod prompt;
pub mod retry;
pub mod router;

pub use json::{Extraction, extract_structured};
pub use model::LanguageModel;
pub use prompt::{Bindings, PromptTemplate, render, sanitize_for_prompt};
pub use retry::Retrying;
pub use router::{FallbackModel, Provider, ProviderSelection};
