//! Pipeline errors.
//!
//! Each variant's display text is what a caller of `Router::ask` sees, so the
//! wording is stable and always starts with "Error".

use crate::synthesizer::EvidenceKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("Error: question is empty")]
    EmptyQuestion,

    /// The topic's store could not be opened or introspected
    #[error("Error getting schema: {0}")]
    SchemaUnavailable(String),

    /// The backend call translating the question to SQL failed
    #[error("Error generating SQL query: {0}")]
    QueryGenerationFailed(String),

    /// The generated SQL was rejected, malformed, or failed at execution time
    #[error("Error querying database: {0}")]
    QueryExecutionFailed(String),

    /// The backend call composing the final answer failed
    #[error("Error {}: {}", .kind.failure_action(), .message)]
    SynthesisFailed { kind: EvidenceKind, message: String },

    /// The search provider call failed
    #[error("Error performing web search: {0}")]
    SearchFailed(String),
}
