//! Best-effort HTML page scraping.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::PageScraper;

const REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_CHARS_PER_PAGE: usize = 20_000;
const USER_AGENT: &str = concat!("pricewise/", env!("CARGO_PKG_VERSION"));
/// Line width handed to html2text; long enough that prices stay on one line.
const TEXT_WIDTH: usize = 120;
/// Tried in order; the first match is treated as the page's main content.
const CONTENT_SELECTORS: [&str; 3] = ["main", "article", "body"];
const HIDDEN_SELECTOR: &str = "script, style, noscript, template, svg";

/// Reduce an HTML document to its visible text.
pub fn html_to_text(html: &str) -> String {
    let content = main_content(html).unwrap_or_else(|| html.to_string());
    let text = html2text::from_read(content.as_bytes(), TEXT_WIDTH);

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialized HTML of the main content element, with non-visible subtrees
/// removed.
fn main_content(html: &str) -> Option<String> {
    let mut document = Html::parse_document(html);

    if let Ok(hidden) = Selector::parse(HIDDEN_SELECTOR) {
        let ids: Vec<_> = document.select(&hidden).map(|element| element.id()).collect();
        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    CONTENT_SELECTORS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document.select(&selector).next().map(|element| element.html())
    })
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text,
    }
}

/// [`PageScraper`] that fetches pages over HTTP and strips markup.
#[derive(Debug, Clone)]
pub struct HttpScraper {
    client: reqwest::Client,
    max_chars_per_page: usize,
}

impl HttpScraper {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            max_chars_per_page: DEFAULT_MAX_CHARS_PER_PAGE,
        })
    }

    #[must_use]
    pub fn with_max_chars_per_page(mut self, max: usize) -> Self {
        self.max_chars_per_page = max;
        self
    }

    async fn fetch(&self, url: &str) -> Result<String, String> {
        let resp = self.client.get(url).send().await.map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }
        resp.text().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl PageScraper for HttpScraper {
    async fn scrape(&self, urls: &[String]) -> Vec<String> {
        let mut pages = Vec::with_capacity(urls.len());

        for url in urls {
            match self.fetch(url).await {
                Ok(html) => {
                    let text = truncate_chars(html_to_text(&html), self.max_chars_per_page);
                    debug!(url = %url, chars = text.len(), "Scraped page");
                    if !text.is_empty() {
                        pages.push(text);
                    }
                }
                Err(e) => warn!("Skipping {}: {}", url, e),
            }
        }

        pages
    }
}
