//! Search result types and the search abstraction.

use medassist_core::AppResult;
use serde::{Deserialize, Serialize};

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// Issues free-text queries to an external search provider.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    /// Get the provider name (e.g., "tavily").
    fn provider_name(&self) -> &str;

    /// Search for `query`, returning at most `max_results` hits in provider order.
    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<SearchResult>>;
}

/// Render results as `Title/URL/Content` blocks separated by blank lines.
pub fn render_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("Title: {}\nURL: {}\nContent: {}", r.title, r.url, r.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
