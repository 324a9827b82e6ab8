//! Natural-language answer composition.

use crate::error::AgentError;
use crate::prompts::ModelSettings;
use medassist_llm::LlmClient;
use medassist_prompt::{build_prompt, PromptDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Which kind of evidence an answer is composed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvidenceKind {
    QueryResults,
    SearchResults,
}

impl EvidenceKind {
    /// The step named in a synthesis failure message.
    pub fn failure_action(&self) -> &'static str {
        match self {
            EvidenceKind::QueryResults => "interpreting results",
            EvidenceKind::SearchResults => "synthesizing search results",
        }
    }
}

/// Material the answer is grounded on, already rendered as text.
#[derive(Debug, Clone, Copy)]
pub enum Evidence<'a> {
    QueryResults { sql: &'a str, rendered: &'a str },
    SearchResults { rendered: &'a str },
}

impl Evidence<'_> {
    pub fn kind(&self) -> EvidenceKind {
        match self {
            Evidence::QueryResults { .. } => EvidenceKind::QueryResults,
            Evidence::SearchResults { .. } => EvidenceKind::SearchResults,
        }
    }
}

/// Turns evidence into a prose answer using a mode-specific prompt.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmClient>,
    settings: ModelSettings,
    results_prompt: PromptDefinition,
    search_prompt: PromptDefinition,
}

impl AnswerSynthesizer {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        settings: ModelSettings,
        results_prompt: PromptDefinition,
        search_prompt: PromptDefinition,
    ) -> Self {
        Self {
            llm,
            settings,
            results_prompt,
            search_prompt,
        }
    }

    /// Compose an answer. The backend's text is returned as-is.
    pub async fn synthesize(
        &self,
        question: &str,
        evidence: Evidence<'_>,
    ) -> Result<String, AgentError> {
        let kind = evidence.kind();
        let failed = |message: String| AgentError::SynthesisFailed { kind, message };

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        let prompt = match evidence {
            Evidence::QueryResults { sql, rendered } => {
                variables.insert("sql".to_string(), sql.to_string());
                variables.insert("results".to_string(), rendered.to_string());
                &self.results_prompt
            }
            Evidence::SearchResults { rendered } => {
                variables.insert("search_results".to_string(), rendered.to_string());
                &self.search_prompt
            }
        };

        let built = build_prompt(prompt, variables).map_err(|e| failed(e.detail()))?;
        tracing::debug!(prompt = %prompt.id, "Synthesizing answer");

        let response = self
            .llm
            .complete(&self.settings.request(built))
            .await
            .map_err(|e| failed(e.detail()))?;

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::AgentPrompts;
    use crate::test_support::ScriptedLlm;
    use medassist_core::AppError;

    fn synthesizer(llm: Arc<ScriptedLlm>) -> AnswerSynthesizer {
        let prompts = AgentPrompts::builtin().unwrap();
        AnswerSynthesizer::new(
            llm,
            ModelSettings::new("test-model").with_temperature(Some(0.2)),
            prompts.answer_from_results,
            prompts.answer_from_search,
        )
    }

    #[tokio::test]
    async fn test_query_results_prompt() {
        let llm = Arc::new(ScriptedLlm::replying(&["  The average age is 54.4.\n"]));
        let answer = synthesizer(llm.clone())
            .synthesize(
                "average age?",
                Evidence::QueryResults {
                    sql: "SELECT AVG(age) FROM heart",
                    rendered: "AVG(age)\n--------\n54.4",
                },
            )
            .await
            .unwrap();

        // Backend text is not post-processed
        assert_eq!(answer, "  The average age is 54.4.\n");

        let request = &llm.requests()[0];
        assert!(request.prompt.contains("SELECT AVG(age) FROM heart"));
        assert!(request.prompt.contains("54.4"));
        assert_eq!(request.temperature, Some(0.2));
    }

    #[tokio::test]
    async fn test_search_results_prompt() {
        let llm = Arc::new(ScriptedLlm::replying(&["Thirst and fatigue [1]."]));
        let answer = synthesizer(llm.clone())
            .synthesize(
                "symptoms of diabetes?",
                Evidence::SearchResults {
                    rendered: "Title: A\nURL: https://a.example\nContent: thirst",
                },
            )
            .await
            .unwrap();

        assert_eq!(answer, "Thirst and fatigue [1].");
        assert!(llm.requests()[0].prompt.contains("URL: https://a.example"));
    }

    #[tokio::test]
    async fn test_failure_names_the_mode() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(AppError::Llm("timeout".to_string()))]));
        let err = synthesizer(llm)
            .synthesize("q", Evidence::SearchResults { rendered: "" })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Error synthesizing search results: timeout");
    }
}
