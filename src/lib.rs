//! pricewise - hotel revenue analytics driven by an expert/reviewer LLM loop.
//!
//! # Overview
//!
//! An expert model drafts a structured answer from raw context, a reviewer
//! model critiques it, and the expert revises until the reviewer accepts or
//! the iteration budget runs out. Two use cases sit on top of the loop:
//! competitor pricing extraction from scraped web pages and daily occupancy
//! forecasting from confirmed bookings and local events.

pub mod claude;
pub mod codex;
pub mod config;
pub mod error;
pub mod llm;
pub mod refine;
pub mod usecase;
pub mod web;

// Re-export commonly used types
pub use config::Settings;
pub use error::{ModelError, RefineError, SearchError, TemplateError, UseCaseError};
pub use llm::{Bindings, Extraction, LanguageModel, PromptTemplate, Provider};
pub use refine::{AcceptancePolicy, IterationRecord, RefinementLoop, RefinementResult, Termination};
pub use usecase::{
    BookingInput, ForecastOutput, HotelPricingResponse, ModelPair, PricingRequest, WebSources,
};
