//! Brave Search API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::SearchError;

use super::LinkSearch;

const DEFAULT_BASE_URL: &str = "https://api.search.brave.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;
/// Brave caps `count` at 20.
const MAX_COUNT: usize = 20;

#[derive(Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Deserialize)]
struct BraveResult {
    url: String,
}

/// [`LinkSearch`] backed by the Brave web search API.
#[derive(Debug, Clone)]
pub struct BraveSearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl BraveSearch {
    pub fn new(api_key: impl Into<String>) -> Result<Self, SearchError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SearchError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(SearchError::Request)?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at another host (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LinkSearch for BraveSearch {
    async fn top_links(&self, query: &str, count: usize) -> Result<Vec<String>, SearchError> {
        let count = count.clamp(1, MAX_COUNT);
        let url = format!(
            "{}/res/v1/web/search?q={}&count={count}",
            self.base_url,
            urlencoded(query),
        );

        let resp = self
            .client
            .get(&url)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(SearchError::Request)?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchError::Status { status, body });
        }

        let body: BraveResponse = resp.json().await.map_err(SearchError::Request)?;
        let links: Vec<String> = body
            .web
            .map(|web| web.results.into_iter().map(|r| r.url).collect())
            .unwrap_or_default();

        debug!(query, found = links.len(), "Brave search complete");
        Ok(links.into_iter().take(count).collect())
    }
}

/// Minimal percent-encoding for URL query parameters.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn urlencoded_escapes_reserved_characters() {
        assert_eq!(urlencoded(r#"Inn "Stony Brook, NY""#), "Inn+%22Stony+Brook%2C+NY%22");
        assert_eq!(urlencoded("é"), "%C3%A9");
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(BraveSearch::new("  "), Err(SearchError::MissingApiKey)));
    }

    #[tokio::test]
    async fn returns_result_urls_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/res/v1/web/search"))
            .and(query_param("q", "hotels near Stony Brook"))
            .and(query_param("count", "2"))
            .and(header("X-Subscription-Token", "key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "web": {"results": [
                    {"url": "https://a.example", "title": "A"},
                    {"url": "https://b.example", "title": "B"},
                    {"url": "https://c.example", "title": "C"}
                ]}
            })))
            .mount(&server)
            .await;

        let search = BraveSearch::new("key").unwrap().with_base_url(server.uri());
        let links = search.top_links("hotels near Stony Brook", 2).await.unwrap();
        assert_eq!(links, vec!["https://a.example", "https://b.example"]);
    }

    #[tokio::test]
    async fn missing_web_section_yields_no_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"query": {}})))
            .mount(&server)
            .await;

        let search = BraveSearch::new("key").unwrap().with_base_url(server.uri());
        assert!(search.top_links("anything", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn http_error_is_reported_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let search = BraveSearch::new("key").unwrap().with_base_url(server.uri());
        match search.top_links("q", 5).await {
            Err(SearchError::Status { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("Expected Status error, got {other:?}"),
        }
    }
}
