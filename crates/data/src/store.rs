//! SQLite-backed dataset stores, one file per topic.
//!
//! Every call opens its own read-only connection and drops it before
//! returning. Nothing is pooled or cached between calls.

use crate::query::{run_query, QueryExecutor, QueryResult};
use crate::schema::{describe_connection, SchemaDescription, SchemaInspector};
use medassist_core::config::QueryLimits;
use medassist_core::{AppConfig, AppError, AppResult, Topic};
use rusqlite::{Connection, OpenFlags};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The fixed set of topic stores.
#[derive(Debug, Clone)]
pub struct SqliteStores {
    paths: HashMap<Topic, PathBuf>,
    limits: QueryLimits,
}

impl SqliteStores {
    /// Create stores from explicit paths.
    pub fn new(paths: HashMap<Topic, PathBuf>, limits: QueryLimits) -> Self {
        Self { paths, limits }
    }

    /// Create stores from the resolved dataset paths in configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.dataset_paths(), config.query)
    }

    /// Path of a topic's store, if configured.
    pub fn path(&self, topic: Topic) -> Option<&Path> {
        self.paths.get(&topic).map(PathBuf::as_path)
    }

    fn open(&self, topic: Topic) -> AppResult<Connection> {
        let path = self.path(topic).ok_or_else(|| {
            AppError::Database(format!("No store configured for topic '{}'", topic))
        })?;

        if !path.exists() {
            return Err(AppError::Database(format!(
                "Store for topic '{}' not found at {:?}",
                topic, path
            )));
        }

        tracing::debug!(%topic, ?path, "Opening store read-only");

        Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            AppError::Database(format!(
                "Failed to open store for topic '{}' at {:?}: {}",
                topic, path, e
            ))
        })
    }
}

impl SchemaInspector for SqliteStores {
    fn describe(&self, topic: Topic) -> AppResult<SchemaDescription> {
        let conn = self.open(topic)?;
        let schema = describe_connection(&conn, topic)?;
        tracing::debug!(%topic, tables = schema.tables.len(), "Described store");
        Ok(schema)
    }
}

impl QueryExecutor for SqliteStores {
    fn execute(&self, topic: Topic, sql: &str) -> AppResult<QueryResult> {
        let conn = self.open(topic)?;
        let result = run_query(&conn, sql, &self.limits)?;
        tracing::debug!(
            %topic,
            rows = result.rows.len(),
            truncated = result.truncated,
            "Executed query"
        );
        Ok(result)
    }
}
