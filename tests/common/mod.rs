//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use pricewise::error::{ClaudeError, ModelError, SearchError};
use pricewise::llm::LanguageModel;
use pricewise::web::{LinkSearch, PageScraper};

/// A model that replays canned responses in order and records every prompt.
///
/// Once the script runs out, the last response is repeated.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_results(responses.into_iter().map(|r| Ok(r.into())))
    }

    /// Always answer with `response`.
    pub fn always(response: &str) -> Self {
        Self::new([response])
    }

    /// `Err` entries become a failed Claude execution.
    pub fn from_results<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<String, String>>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let next = self.responses.lock().unwrap().pop_front();
        let response = match next {
            Some(response) => {
                *self.last.lock().unwrap() = Some(response.clone());
                response
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Ok(String::new())),
        };

        response.map_err(|msg| ModelError::Claude(ClaudeError::ExecutionFailed(msg)))
    }
}

/// Search backend returning a fixed list of links.
pub struct FixedSearch {
    pub links: Vec<String>,
    pub queries: Mutex<Vec<String>>,
}

impl FixedSearch {
    pub fn new(links: &[&str]) -> Self {
        Self {
            links: links.iter().map(|l| l.to_string()).collect(),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LinkSearch for FixedSearch {
    async fn top_links(&self, query: &str, count: usize) -> Result<Vec<String>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.links.iter().take(count).cloned().collect())
    }
}

/// Search backend that always fails.
pub struct FailingSearch;

#[async_trait]
impl LinkSearch for FailingSearch {
    async fn top_links(&self, _query: &str, _count: usize) -> Result<Vec<String>, SearchError> {
        Err(SearchError::MissingApiKey)
    }
}

/// Scraper that returns a canned page body per URL.
pub struct FixedScraper {
    pub pages: Vec<(String, String)>,
}

impl FixedScraper {
    pub fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl PageScraper for FixedScraper {
    async fn scrape(&self, urls: &[String]) -> Vec<String> {
        urls.iter()
            .filter_map(|url| {
                self.pages
                    .iter()
                    .find(|(known, _)| known == url)
                    .map(|(_, body)| body.clone())
            })
            .collect()
    }
}

/// Write an executable shell script into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}
