//! Tavily search provider.
//!
//! API: https://docs.tavily.com/documentation/api-reference/endpoint/search

use crate::types::{SearchResult, WebSearch};
use medassist_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com";

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Debug, Deserialize)]
struct TavilyHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TavilyError {
    detail: Option<TavilyErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct TavilyErrorDetail {
    error: Option<String>,
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Tavily search client.
#[derive(Debug)]
pub struct TavilyClient {
    base_url: String,
    api_key: ApiKey,
    client: reqwest::Client,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_TAVILY_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: ApiKey(api_key.into().trim().to_string()),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client whose requests fail after `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Search(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            ..Self::with_base_url(base_url, api_key)
        })
    }
}

#[async_trait::async_trait]
impl WebSearch for TavilyClient {
    fn provider_name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<SearchResult>> {
        tracing::debug!(max_results, "Sending search request to Tavily");

        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key.0)
            .json(&TavilyRequest { query, max_results })
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to send request to Tavily: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<TavilyError>(&text)
                .ok()
                .and_then(|e| e.detail)
                .and_then(|d| d.error)
                .unwrap_or(text);
            return Err(AppError::Search(format!(
                "Tavily API error ({}): {}",
                status, detail
            )));
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse Tavily response: {}", e)))?;

        let results: Vec<SearchResult> = body
            .results
            .into_iter()
            .take(max_results)
            .map(|hit| SearchResult {
                title: hit.title,
                url: hit.url,
                content: hit.content,
            })
            .collect();

        tracing::debug!(count = results.len(), "Received search results from Tavily");
        Ok(results)
    }
}
