//! Web search and page scraping collaborators for the pricing use case.

pub mod scrape;
pub mod search;

use async_trait::async_trait;

use crate::error::SearchError;

pub use scrape::{HttpScraper, html_to_text};
pub use search::BraveSearch;

/// Finds pages likely to contain relevant text for a query.
#[async_trait]
pub trait LinkSearch: Send + Sync {
    async fn top_links(&self, query: &str, count: usize) -> Result<Vec<String>, SearchError>;
}

/// Turns pages into plain text, best effort.
///
/// Pages that cannot be fetched are skipped rather than reported.
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape(&self, urls: &[String]) -> Vec<String>;
}
