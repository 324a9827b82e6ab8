//! Question routing and the two answer flows.

use crate::classify::{Classifier, Route};
use crate::error::AgentError;
use crate::generator::QueryGenerator;
use crate::prompts::{AgentPrompts, ModelSettings};
use crate::synthesizer::{AnswerSynthesizer, Evidence};
use medassist_core::Topic;
use medassist_data::{QueryExecutor, SchemaInspector};
use medassist_llm::LlmClient;
use medassist_search::{render_results, WebSearch};
use serde::Serialize;
use std::sync::Arc;
use tracing::Instrument;

/// Answer text returned when a question needs the web but no search
/// provider is configured.
pub const SEARCH_NOT_CONFIGURED: &str =
    "Web search is not configured. Please provide a Tavily API key.";

const DEFAULT_MAX_SEARCH_RESULTS: usize = 3;

/// External collaborators the pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub llm: Arc<dyn LlmClient>,
    pub schema: Arc<dyn SchemaInspector>,
    pub executor: Arc<dyn QueryExecutor>,
    /// `None` when no search provider is configured
    pub search: Option<Arc<dyn WebSearch>>,
}

/// A web source an answer was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
}

/// Result of answering one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    pub route: Route,
    /// The executed query, for dataset answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
    /// True when the answer is a fixed fallback rather than a composed one
    pub degraded: bool,
}

/// Classifies questions and dispatches them to the dataset or web flow.
pub struct Router {
    classifier: Classifier,
    generator: QueryGenerator,
    synthesizer: AnswerSynthesizer,
    schema: Arc<dyn SchemaInspector>,
    executor: Arc<dyn QueryExecutor>,
    search: Option<Arc<dyn WebSearch>>,
    max_search_results: usize,
}

impl Router {
    pub fn new(collaborators: Collaborators, settings: ModelSettings, prompts: AgentPrompts) -> Self {
        let Collaborators {
            llm,
            schema,
            executor,
            search,
        } = collaborators;

        Self {
            classifier: Classifier::default(),
            generator: QueryGenerator::new(llm.clone(), settings.clone(), prompts.sql_generate),
            synthesizer: AnswerSynthesizer::new(
                llm,
                settings,
                prompts.answer_from_results,
                prompts.answer_from_search,
            ),
            schema,
            executor,
            search,
            max_search_results: DEFAULT_MAX_SEARCH_RESULTS,
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_max_search_results(mut self, max_results: usize) -> Self {
        self.max_search_results = max_results;
        self
    }

    pub fn classify(&self, question: &str) -> Route {
        self.classifier.classify(question)
    }

    /// Answer a question, returning the first failure encountered.
    pub async fn answer(&self, question: &str) -> Result<Answer, AgentError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AgentError::EmptyQuestion);
        }

        let route = self.classify(question);
        let topic = route.topic.map(|t| t.as_str()).unwrap_or("none");
        let span = tracing::info_span!("ask", topic, intent = ?route.intent);

        async {
            tracing::info!("Question classified");
            match route.dataset() {
                Some(dataset) => self.answer_from_dataset(question, route, dataset).await,
                None => self.answer_from_web(question, route).await,
            }
        }
        .instrument(span)
        .await
    }

    /// Answer a question as plain text; failures become their message.
    pub async fn ask(&self, question: &str) -> String {
        match self.answer(question).await {
            Ok(answer) => answer.text,
            Err(err) => {
                tracing::warn!(error = %err, "Question could not be answered");
                err.to_string()
            }
        }
    }

    async fn answer_from_dataset(
        &self,
        question: &str,
        route: Route,
        topic: Topic,
    ) -> Result<Answer, AgentError> {
        let schema = self
            .schema
            .describe(topic)
            .map_err(|e| AgentError::SchemaUnavailable(e.detail()))?;
        tracing::info!(tables = schema.tables.len(), "Schema loaded");

        let sql = self.generator.generate(question, &schema).await?;

        let result = self
            .executor
            .execute(topic, &sql)
            .map_err(|e| AgentError::QueryExecutionFailed(e.detail()))?;
        tracing::info!(
            rows = result.rows.len(),
            truncated = result.truncated,
            "Query executed"
        );

        let rendered = result.render();
        let text = self
            .synthesizer
            .synthesize(
                question,
                Evidence::QueryResults {
                    sql: &sql,
                    rendered: &rendered,
                },
            )
            .await?;

        Ok(Answer {
            text,
            route,
            sql: Some(sql),
            sources: Vec::new(),
            degraded: false,
        })
    }

    async fn answer_from_web(&self, question: &str, route: Route) -> Result<Answer, AgentError> {
        let Some(search) = &self.search else {
            tracing::info!("No search provider configured");
            return Ok(Answer {
                text: SEARCH_NOT_CONFIGURED.to_string(),
                route,
                sql: None,
                sources: Vec::new(),
                degraded: true,
            });
        };

        let results: Vec<_> = search
            .search(question, self.max_search_results)
            .await
            .map_err(|e| AgentError::SearchFailed(e.detail()))?
            .into_iter()
            .take(self.max_search_results)
            .collect();
        tracing::info!(
            provider = search.provider_name(),
            count = results.len(),
            "Search completed"
        );

        let rendered = render_results(&results);
        let text = self
            .synthesizer
            .synthesize(question, Evidence::SearchResults { rendered: &rendered })
            .await?;

        Ok(Answer {
            text,
            route,
            sql: None,
            sources: results
                .into_iter()
                .map(|r| SourceRef {
                    title: r.title,
                    url: r.url,
                })
                .collect(),
            degraded: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Intent, TopicRule};
    use crate::test_support::{search_hit, FakeSearch, FakeStore, ScriptedLlm};
    use medassist_core::AppError;
    use medassist_core::config::QueryLimits;
    use medassist_data::{QueryResult, SqliteStores, Value};
    use std::collections::HashMap;

    fn avg_result() -> QueryResult {
        QueryResult {
            columns: vec!["avg_age".to_string()],
            rows: vec![vec![Value::Real(54.4)]],
            truncated: false,
        }
    }

    fn router(
        llm: Arc<ScriptedLlm>,
        store: Arc<FakeStore>,
        search: Option<Arc<FakeSearch>>,
    ) -> Router {
        Router::new(
            Collaborators {
                llm,
                schema: store.clone(),
                executor: store,
                search: search.map(|s| s as Arc<dyn WebSearch>),
            },
            ModelSettings::new("test-model"),
            AgentPrompts::builtin().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_dataset_flow() {
        let llm = Arc::new(ScriptedLlm::replying(&[
            "```sql\nSELECT AVG(age) AS avg_age FROM heart WHERE target = 1\n```",
            "Patients with heart disease are 54.4 years old on average.",
        ]));
        let store = Arc::new(FakeStore::new(Ok(avg_result())));
        let router = router(llm.clone(), store.clone(), None);

        let answer = router
            .answer("What is the average age of patients with heart disease?")
            .await
            .unwrap();

        assert_eq!(
            answer.text,
            "Patients with heart disease are 54.4 years old on average."
        );
        assert_eq!(answer.route.dataset(), Some(Topic::Heart));
        assert_eq!(
            answer.sql.as_deref(),
            Some("SELECT AVG(age) AS avg_age FROM heart WHERE target = 1")
        );
        assert!(!answer.degraded);

        assert_eq!(
            store.executed(),
            vec![(
                Topic::Heart,
                "SELECT AVG(age) AS avg_age FROM heart WHERE target = 1".to_string()
            )]
        );

        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].prompt.contains("54.4"));
    }

    #[tokio::test]
    async fn test_mixed_topics_query_heart_store() {
        let llm = Arc::new(ScriptedLlm::replying(&["SELECT COUNT(*) FROM heart", "12"]));
        let store = Arc::new(FakeStore::new(Ok(avg_result())));
        let router = router(llm, store.clone(), None);

        router
            .answer("How many cancer patients also have cardiac records?")
            .await
            .unwrap();

        assert_eq!(store.executed()[0].0, Topic::Heart);
    }

    #[tokio::test]
    async fn test_executor_failure_skips_synthesis() {
        let llm = Arc::new(ScriptedLlm::replying(&["SELECT * FROM tumors"]));
        let store = Arc::new(FakeStore::new(Err("no such table: tumors".to_string())));
        let router = router(llm.clone(), store, None);

        let text = router.ask("How many cancer cases are in the dataset?").await;

        assert_eq!(text, "Error querying database: no such table: tumors");
        // Only the SQL generation call happened
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_synthesis_failure_after_query() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("SELECT AVG(age) AS avg_age FROM heart".to_string()),
            Err(AppError::Llm("timeout".to_string())),
        ]));
        let store = Arc::new(FakeStore::new(Ok(avg_result())));
        let router = router(llm.clone(), store.clone(), None);

        let text = router.ask("Average age of heart patients?").await;

        assert_eq!(text, "Error interpreting results: timeout");
        assert_eq!(store.executed().len(), 1);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_search_results_are_capped() {
        let llm = Arc::new(ScriptedLlm::replying(&["Insulin was discovered in 1921."]));
        let store = Arc::new(FakeStore::new(Ok(avg_result())));
        let hits = (1..=5).map(search_hit).collect();
        let search = Arc::new(FakeSearch::new(Ok(hits)));
        let router = router(llm.clone(), store, Some(search));

        let answer = router.answer("What is the history of insulin?").await.unwrap();

        assert_eq!(answer.sources.len(), 3);
        let prompt = &llm.requests()[0].prompt;
        assert!(prompt.contains("Title: Source 3"));
        assert!(!prompt.contains("Title: Source 4"));
    }

    #[tokio::test]
    async fn test_schema_failure() {
        let llm = Arc::new(ScriptedLlm::default());
        let store = Arc::new(
            FakeStore::new(Ok(avg_result())).with_schema_error("diabetes.db not found"),
        );
        let router = router(llm.clone(), store.clone(), None);

        let text = router.ask("Average glucose of patients?").await;

        assert_eq!(text, "Error getting schema: diabetes.db not found");
        assert_eq!(llm.call_count(), 0);
        assert!(store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_no_search_configured() {
        let llm = Arc::new(ScriptedLlm::default());
        let store = Arc::new(FakeStore::new(Ok(avg_result())));
        let router = router(llm.clone(), store, None);

        let answer = router
            .answer("What are the common symptoms of diabetes?")
            .await
            .unwrap();

        assert_eq!(answer.text, SEARCH_NOT_CONFIGURED);
        assert!(answer.degraded);
        assert_eq!(answer.route.intent, Intent::GeneralKnowledge);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_web_flow() {
        let llm = Arc::new(ScriptedLlm::replying(&["Common symptoms include thirst [1]."]));
        let store = Arc::new(FakeStore::new(Ok(avg_result())));
        let search = Arc::new(FakeSearch::new(Ok(vec![search_hit(1), search_hit(2)])));
        let router = router(llm.clone(), store.clone(), Some(search.clone()));

        let answer = router
            .answer("What are the common symptoms of diabetes?")
            .await
            .unwrap();

        assert_eq!(answer.text, "Common symptoms include thirst [1].");
        assert_eq!(
            search.queries(),
            vec![("What are the common symptoms of diabetes?".to_string(), 3)]
        );
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[1].url, "https://example.org/2");
        assert!(store.executed().is_empty());

        let prompt = &llm.requests()[0].prompt;
        assert!(prompt.contains("Title: Source 1\nURL: https://example.org/1\nContent: Finding 1"));
    }

    #[tokio::test]
    async fn test_search_failure() {
        let llm = Arc::new(ScriptedLlm::default());
        let store = Arc::new(FakeStore::new(Ok(avg_result())));
        let search = Arc::new(FakeSearch::new(Err("rate limited".to_string())));
        let router = router(llm.clone(), store, Some(search)).with_max_search_results(5);

        let text = router.ask("What is the history of insulin?").await;

        assert_eq!(text, "Error performing web search: rate limited");
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_question() {
        let router = router(
            Arc::new(ScriptedLlm::default()),
            Arc::new(FakeStore::new(Ok(avg_result()))),
            None,
        );
        assert_eq!(router.answer("   ").await.unwrap_err(), AgentError::EmptyQuestion);
    }

    #[tokio::test]
    async fn test_custom_classifier() {
        let router = router(
            Arc::new(ScriptedLlm::default()),
            Arc::new(FakeStore::new(Ok(avg_result()))),
            None,
        )
        .with_classifier(Classifier::new(
            vec![TopicRule::new(Topic::Diabetes, &["sugar"])],
            &["rows"],
        ));

        assert_eq!(router.classify("sugar rows").dataset(), Some(Topic::Diabetes));
        assert_eq!(router.classify("heart data").topic, None);
    }

    #[tokio::test]
    async fn test_dataset_flow_against_sqlite_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("heart_disease.db");
        {
            let conn = rusqlite::Connection::open(&db).unwrap();
            conn.execute_batch(
                "CREATE TABLE heart (age INTEGER, target INTEGER);
                 INSERT INTO heart VALUES (50, 1), (60, 1), (40, 0);",
            )
            .unwrap();
        }

        let mut paths = HashMap::new();
        paths.insert(Topic::Heart, db);
        let stores = Arc::new(SqliteStores::new(paths, QueryLimits::default()));

        let llm = Arc::new(ScriptedLlm::replying(&[
            "```sql\nSELECT AVG(age) AS avg_age FROM heart WHERE target = 1;\n```",
            "55 years.",
        ]));
        let router = Router::new(
            Collaborators {
                llm: llm.clone(),
                schema: stores.clone(),
                executor: stores,
                search: None,
            },
            ModelSettings::new("test-model"),
            AgentPrompts::builtin().unwrap(),
        );

        let answer = router
            .answer("Average age of heart disease patients?")
            .await
            .unwrap();
        assert_eq!(answer.text, "55 years.");

        let requests = llm.requests();
        assert!(requests[0].prompt.contains("  age (INTEGER)"));
        assert!(requests[1].prompt.contains("55"));
    }

    #[tokio::test]
    async fn test_write_statement_is_rejected_by_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("cancer.db");
        {
            let conn = rusqlite::Connection::open(&db).unwrap();
            conn.execute_batch("CREATE TABLE cancer (diagnosis TEXT);")
                .unwrap();
        }

        let mut paths = HashMap::new();
        paths.insert(Topic::Cancer, db);
        let stores = Arc::new(SqliteStores::new(paths, QueryLimits::default()));

        let llm = Arc::new(ScriptedLlm::replying(&["DROP TABLE cancer"]));
        let router = Router::new(
            Collaborators {
                llm: llm.clone(),
                schema: stores.clone(),
                executor: stores,
                search: None,
            },
            ModelSettings::new("test-model"),
            AgentPrompts::builtin().unwrap(),
        );

        let text = router.ask("Count malignant cases in the dataset").await;
        assert!(text.starts_with("Error querying database: "), "{}", text);
        assert_eq!(llm.call_count(), 1);
    }
}
