//! Prompt set and model settings shared by the generator and synthesizer.

use medassist_core::AppResult;
use medassist_llm::LlmRequest;
use medassist_prompt::{builtin_prompt, load_prompt, BuiltPrompt, PromptDefinition};
use std::path::Path;

pub const SQL_GENERATE_PROMPT: &str = "sql.generate";
pub const ANSWER_FROM_RESULTS_PROMPT: &str = "answer.from_results";
pub const ANSWER_FROM_SEARCH_PROMPT: &str = "answer.from_search";

/// The three prompt definitions the pipeline renders.
#[derive(Debug, Clone)]
pub struct AgentPrompts {
    pub sql_generate: PromptDefinition,
    pub answer_from_results: PromptDefinition,
    pub answer_from_search: PromptDefinition,
}

impl AgentPrompts {
    /// Built-in definitions only.
    pub fn builtin() -> AppResult<Self> {
        Ok(Self {
            sql_generate: builtin_prompt(SQL_GENERATE_PROMPT)?,
            answer_from_results: builtin_prompt(ANSWER_FROM_RESULTS_PROMPT)?,
            answer_from_search: builtin_prompt(ANSWER_FROM_SEARCH_PROMPT)?,
        })
    }

    /// Built-in definitions with workspace overrides applied.
    pub fn load(workspace: &Path) -> AppResult<Self> {
        Ok(Self {
            sql_generate: load_prompt(workspace, SQL_GENERATE_PROMPT)?,
            answer_from_results: load_prompt(workspace, ANSWER_FROM_RESULTS_PROMPT)?,
            answer_from_search: load_prompt(workspace, ANSWER_FROM_SEARCH_PROMPT)?,
        })
    }
}

/// Model and sampling options applied to every backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ModelSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Turn a rendered prompt into a backend request.
    pub fn request(&self, built: BuiltPrompt) -> LlmRequest {
        let mut request = LlmRequest::new(built.user, &self.model);

        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        request
    }
}
