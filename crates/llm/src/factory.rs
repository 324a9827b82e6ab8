//! LLM provider factory.
//!
//! Builds an [`LlmClient`] from a provider name plus the endpoint, key and
//! timeout resolved from configuration.

use crate::client::LlmClient;
use crate::providers::{gemini::DEFAULT_GEMINI_URL, ollama::DEFAULT_OLLAMA_URL};
use crate::providers::{GeminiClient, OllamaClient};
use crate::types::ProviderType;
use medassist_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required by gemini)
/// * `timeout_secs` - Optional per-request HTTP timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required key is
/// missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout_secs: Option<u64>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    let timeout = timeout_secs.map(Duration::from_secs);

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(DEFAULT_OLLAMA_URL);
            let client = match timeout {
                Some(timeout) => OllamaClient::with_timeout(base_url, timeout)?,
                None => OllamaClient::with_base_url(base_url),
            };
            Ok(Arc::new(client))
        }
        ProviderType::Gemini => {
            let api_key = api_key
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| AppError::Config("Gemini provider requires API key".to_string()))?;
            let base_url = endpoint.unwrap_or(DEFAULT_GEMINI_URL);
            let client = match timeout {
                Some(timeout) => GeminiClient::with_timeout(base_url, api_key, timeout)?,
                None => GeminiClient::with_base_url(base_url, api_key),
            };
            Ok(Arc::new(client))
        }
    }
}
