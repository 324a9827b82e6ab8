//! Web search for medassist.
//!
//! Defines the [`WebSearch`] abstraction and a Tavily implementation.

pub mod tavily;
pub mod types;

pub use tavily::TavilyClient;
pub use types::{render_results, SearchResult, WebSearch};

use medassist_core::{config::SearchConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Build the configured search client.
///
/// Returns `Ok(None)` when no API key is available; the router then answers
/// general questions with a fixed "not configured" message.
pub fn create_search(
    config: &SearchConfig,
    api_key: Option<&str>,
) -> AppResult<Option<Arc<dyn WebSearch>>> {
    if !config.provider.eq_ignore_ascii_case("tavily") {
        return Err(AppError::Config(format!(
            "Unknown search provider: {}. Supported: tavily",
            config.provider
        )));
    }

    let Some(api_key) = api_key.filter(|key| !key.trim().is_empty()) else {
        tracing::info!("Web search not configured (no {} set)", config.api_key_env);
        return Ok(None);
    };

    let endpoint = config.endpoint.as_deref().unwrap_or(tavily::DEFAULT_TAVILY_URL);
    let client = match config.timeout {
        Some(secs) => TavilyClient::with_timeout(endpoint, api_key, Duration::from_secs(secs))?,
        None => TavilyClient::with_base_url(endpoint, api_key),
    };

    Ok(Some(Arc::new(client)))
}
