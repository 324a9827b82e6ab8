//! Natural-language to SQL translation.

use crate::error::AgentError;
use crate::prompts::ModelSettings;
use medassist_data::SchemaDescription;
use medassist_llm::LlmClient;
use medassist_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;

const FENCE: &str = "```";

/// Asks the backend for a single SQL query answering a question.
///
/// The query is not checked against the schema here; the executor's guard
/// and SQLite itself reject anything invalid.
pub struct QueryGenerator {
    llm: Arc<dyn LlmClient>,
    settings: ModelSettings,
    prompt: PromptDefinition,
}

impl QueryGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, settings: ModelSettings, prompt: PromptDefinition) -> Self {
        Self {
            llm,
            settings,
            prompt,
        }
    }

    pub async fn generate(
        &self,
        question: &str,
        schema: &SchemaDescription,
    ) -> Result<String, AgentError> {
        let mut variables = HashMap::new();
        variables.insert("schema".to_string(), schema.to_string());
        variables.insert("question".to_string(), question.to_string());

        let built = build_prompt(&self.prompt, variables)
            .map_err(|e| AgentError::QueryGenerationFailed(e.detail()))?;
        let request = self.settings.request(built);

        let response = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| AgentError::QueryGenerationFailed(e.detail()))?;

        let sql = strip_code_fences(&response.content);
        tracing::debug!(sql = %sql, "Generated SQL");
        Ok(sql)
    }
}

/// Remove markdown code fences a model may wrap around a query.
///
/// Handles a leading fence with an optional `sql` tag in any case and a
/// trailing fence. Text without fences is only trimmed.
pub fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(FENCE) {
        text = rest;
        if let (Some(tag), Some(after)) = (text.get(..3), text.get(3..)) {
            let ends_tag = after.chars().next().map_or(true, char::is_whitespace);
            if tag.eq_ignore_ascii_case("sql") && ends_tag {
                text = after;
            }
        }
    }

    if let Some(rest) = text.trim_end().strip_suffix(FENCE) {
        text = rest;
    }

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::AgentPrompts;
    use crate::test_support::{heart_schema, ScriptedLlm};
    use medassist_core::AppError;

    fn generator(llm: Arc<ScriptedLlm>) -> QueryGenerator {
        QueryGenerator::new(
            llm,
            ModelSettings::new("test-model"),
            AgentPrompts::builtin().unwrap().sql_generate,
        )
    }

    #[test]
    fn test_strip_sql_fence() {
        assert_eq!(
            strip_code_fences("```sql\nSELECT AVG(age) FROM heart\n```"),
            "SELECT AVG(age) FROM heart"
        );
    }

    #[test]
    fn test_strip_variants() {
        assert_eq!(strip_code_fences("  SELECT 1  "), "SELECT 1");
        assert_eq!(strip_code_fences("```\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_code_fences("```SQL\nSELECT 1;\n```\n"), "SELECT 1;");
        assert_eq!(strip_code_fences("```SELECT 1```"), "SELECT 1");
        assert_eq!(strip_code_fences("```sql SELECT 1```"), "SELECT 1");
        assert_eq!(strip_code_fences("SELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn test_strip_keeps_identifiers_starting_with_sql() {
        assert_eq!(
            strip_code_fences("```sqlite_version()```"),
            "sqlite_version()"
        );
    }

    #[tokio::test]
    async fn test_generate_renders_schema_and_question() {
        let llm = Arc::new(ScriptedLlm::replying(&[
            "```sql\nSELECT AVG(age) FROM heart WHERE target = 1\n```",
        ]));
        let sql = generator(llm.clone())
            .generate("What is the average age of patients with heart disease?", &heart_schema())
            .await
            .unwrap();

        assert_eq!(sql, "SELECT AVG(age) FROM heart WHERE target = 1");
        assert!(!sql.starts_with("```"));
        assert!(!sql.ends_with("```"));

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "test-model");
        assert!(requests[0].prompt.contains("Table: heart"));
        assert!(requests[0].prompt.contains("  age (INTEGER)"));
        assert!(requests[0]
            .prompt
            .contains("Question: What is the average age of patients with heart disease?"));
    }

    #[tokio::test]
    async fn test_generate_backend_failure() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(AppError::Llm(
            "quota exceeded".to_string(),
        ))]));
        let err = generator(llm)
            .generate("count heart records", &heart_schema())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Error generating SQL query: quota exceeded");
    }
}
