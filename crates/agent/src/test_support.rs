//! Scripted collaborators for pipeline tests.

use medassist_core::{AppError, AppResult, Topic};
use medassist_data::{
    ColumnSchema, QueryExecutor, QueryResult, SchemaDescription, SchemaInspector, TableSchema,
};
use medassist_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use medassist_search::{SearchResult, WebSearch};
use std::collections::VecDeque;
use std::sync::Mutex;

/// LLM double that replays queued replies and records every request.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<AppResult<String>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<AppResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Llm("no scripted reply left".to_string())))?;

        Ok(LlmResponse {
            content: reply,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

/// Store double with a fixed schema and a fixed query outcome.
pub struct FakeStore {
    schema: Result<SchemaDescription, String>,
    result: Result<QueryResult, String>,
    executed: Mutex<Vec<(Topic, String)>>,
}

impl FakeStore {
    pub fn new(result: Result<QueryResult, String>) -> Self {
        Self {
            schema: Ok(heart_schema()),
            result,
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_schema_error(mut self, message: &str) -> Self {
        self.schema = Err(message.to_string());
        self
    }

    pub fn executed(&self) -> Vec<(Topic, String)> {
        self.executed.lock().unwrap().clone()
    }
}

impl SchemaInspector for FakeStore {
    fn describe(&self, topic: Topic) -> AppResult<SchemaDescription> {
        match &self.schema {
            Ok(schema) => Ok(SchemaDescription {
                topic,
                tables: schema.tables.clone(),
            }),
            Err(message) => Err(AppError::Database(message.clone())),
        }
    }
}

impl QueryExecutor for FakeStore {
    fn execute(&self, topic: Topic, sql: &str) -> AppResult<QueryResult> {
        self.executed.lock().unwrap().push((topic, sql.to_string()));
        self.result.clone().map_err(AppError::Database)
    }
}

/// Search double returning fixed hits or a fixed failure.
pub struct FakeSearch {
    outcome: Result<Vec<SearchResult>, String>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl FakeSearch {
    pub fn new(outcome: Result<Vec<SearchResult>, String>) -> Self {
        Self {
            outcome,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl WebSearch for FakeSearch {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<SearchResult>> {
        self.queries.lock().unwrap().push((query.to_string(), max_results));
        self.outcome.clone().map_err(AppError::Search)
    }
}

pub fn heart_schema() -> SchemaDescription {
    SchemaDescription {
        topic: Topic::Heart,
        tables: vec![TableSchema {
            name: "heart".to_string(),
            columns: vec![
                ColumnSchema {
                    name: "age".to_string(),
                    declared_type: "INTEGER".to_string(),
                },
                ColumnSchema {
                    name: "target".to_string(),
                    declared_type: "INTEGER".to_string(),
                },
            ],
        }],
    }
}

pub fn search_hit(n: usize) -> SearchResult {
    SearchResult {
        title: format!("Source {}", n),
        url: format!("https://example.org/{}", n),
        content: format!("Finding {}", n),
    }
}
