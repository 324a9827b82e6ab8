//! Error types for medassist.
//!
//! This module defines a unified error enum for the lower layers of the
//! application: configuration, I/O, LLM providers, prompts, dataset stores
//! and web search.

use thiserror::Error;

/// Unified error type for medassist.
///
/// Library functions return `Result<T, AppError>`; the router converts these
/// into its own tagged `AgentError` at the pipeline boundary.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Dataset store errors (open, introspection, query execution)
    #[error("Database error: {0}")]
    Database(String),

    /// Web search provider errors
    #[error("Search error: {0}")]
    Search(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// The message without its category prefix.
    pub fn detail(&self) -> String {
        match self {
            AppError::Config(msg)
            | AppError::Llm(msg)
            | AppError::Prompt(msg)
            | AppError::Database(msg)
            | AppError::Search(msg)
            | AppError::Serialization(msg)
            | AppError::Other(msg) => msg.clone(),
            AppError::Io(err) => err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_prefixes() {
        let err = AppError::Database("no such table: patients".to_string());
        assert_eq!(err.to_string(), "Database error: no such table: patients");

        assert_eq!(err.detail(), "no such table: patients");

        let err = AppError::Other("plain".to_string());
        assert_eq!(err.to_string(), "plain");
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: AppError = parse_err.into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
