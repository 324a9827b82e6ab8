//! Query execution and result rendering.

use crate::guard;
use medassist_core::config::QueryLimits;
use medassist_core::{AppError, AppResult, Topic};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// SQLite VM instructions between deadline checks.
const PROGRESS_CHECK_INTERVAL: i32 = 1000;

/// Runs a structured query against a topic's store.
pub trait QueryExecutor: Send + Sync {
    /// Execute `sql` and materialize every row (up to the row limit).
    fn execute(&self, topic: Topic, sql: &str) -> AppResult<QueryResult>;
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    /// Blobs are summarized by length only
    Blob(usize),
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Value::Blob(bytes.len()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
            Value::Blob(len) => write!(f, "<blob {} bytes>", len),
        }
    }
}

/// Materialized rows of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// True when the row limit cut the result short
    pub truncated: bool,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as an aligned text table for the answer prompt.
    ///
    /// An empty result renders an explicit "no rows" line naming the columns.
    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            if self.truncated {
                return format!(
                    "Rows matched but none were kept by the row limit (columns: {})",
                    self.columns.join(", ")
                );
            }
            return format!("No rows returned (columns: {})", self.columns.join(", "));
        }

        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string().replace('\n', " ")).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let format_line = |values: &[String]| -> String {
            values
                .iter()
                .zip(&widths)
                .map(|(value, width)| format!("{:<width$}", value, width = *width))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut out = String::new();
        out.push_str(&format_line(&self.columns));
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in &cells {
            out.push('\n');
            out.push_str(&format_line(row));
        }

        if self.truncated {
            out.push_str(&format!(
                "\n(showing the first {} rows; further rows were omitted)",
                self.rows.len()
            ));
        }

        out
    }
}

/// Run a guarded query on an open connection.
///
/// The statement must pass [`guard::check_statement`] and be read-only
/// according to SQLite. Rows beyond `limits.max_rows` are dropped and the
/// result is marked truncated. A statement running longer than
/// `limits.timeout_ms` is interrupted.
pub fn run_query(conn: &Connection, sql: &str, limits: &QueryLimits) -> AppResult<QueryResult> {
    if limits.max_rows == 0 {
        return Err(AppError::Database("Row limit must be greater than zero".to_string()));
    }

    let statement = guard::check_statement(sql)?;

    let budget = Duration::from_millis(limits.timeout_ms);
    let started = Instant::now();
    conn.progress_handler(
        PROGRESS_CHECK_INTERVAL,
        Some(move || started.elapsed() > budget),
    );

    let result = collect_rows(conn, statement, limits.max_rows);

    conn.progress_handler(PROGRESS_CHECK_INTERVAL, None::<fn() -> bool>);

    result.map_err(|e| {
        if started.elapsed() > budget {
            AppError::Database(format!(
                "Query exceeded the time limit of {} ms",
                limits.timeout_ms
            ))
        } else {
            AppError::Database(e.to_string())
        }
    })
}

fn collect_rows(
    conn: &Connection,
    statement: &str,
    max_rows: usize,
) -> Result<QueryResult, QueryFailure> {
    let mut stmt = conn.prepare(statement)?;

    if !stmt.readonly() {
        return Err(QueryFailure::NotReadOnly);
    }

    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let column_count = columns.len();

    let mut rows = Vec::new();
    let mut truncated = false;
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        if rows.len() == max_rows {
            truncated = true;
            break;
        }
        let values = (0..column_count)
            .map(|i| row.get_ref(i).map(Value::from))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(values);
    }

    Ok(QueryResult {
        columns,
        rows,
        truncated,
    })
}

enum QueryFailure {
    Sqlite(rusqlite::Error),
    NotReadOnly,
}

impl From<rusqlite::Error> for QueryFailure {
    fn from(err: rusqlite::Error) -> Self {
        QueryFailure::Sqlite(err)
    }
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryFailure::Sqlite(err) => write!(f, "{}", err),
            QueryFailure::NotReadOnly => f.write_str("Statement is not read-only"),
        }
    }
}
