//! Schema introspection for dataset stores.

use medassist_core::{AppError, AppResult, Topic};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reports the structural shape of a topic's store.
pub trait SchemaInspector: Send + Sync {
    /// Describe every user table in the store for `topic`.
    fn describe(&self, topic: Topic) -> AppResult<SchemaDescription>;
}

/// One column and its declared SQLite type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Declared type as written in the table definition; may be empty
    pub declared_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

/// Tables and columns of one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub topic: Topic,
    pub tables: Vec<TableSchema>,
}

impl SchemaDescription {
    /// Look up a table by name (case-insensitive, as SQLite does).
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables
            .iter()
            .find(|table| table.name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for SchemaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Database: {}", self.topic)?;
        for table in &self.tables {
            writeln!(f, "Table: {}", table.name)?;
            for column in &table.columns {
                writeln!(f, "  {} ({})", column.name, column.declared_type)?;
            }
        }
        Ok(())
    }
}

/// Read the schema of an open connection.
///
/// SQLite's own bookkeeping tables (`sqlite_*`) are skipped.
pub fn describe_connection(conn: &Connection, topic: Topic) -> AppResult<SchemaDescription> {
    let mut table_stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
             ORDER BY name",
        )
        .map_err(|e| AppError::Database(format!("Failed to list tables: {}", e)))?;

    let table_names = table_stmt
        .query_map([], |row| row.get::<_, String>(0))
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(|e| AppError::Database(format!("Failed to list tables: {}", e)))?;

    let mut column_stmt = conn
        .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")
        .map_err(|e| AppError::Database(format!("Failed to inspect columns: {}", e)))?;

    let mut tables = Vec::with_capacity(table_names.len());
    for name in table_names {
        let columns = column_stmt
            .query_map(params![name], |row| {
                Ok(ColumnSchema {
                    name: row.get(0)?,
                    declared_type: row.get(1)?,
                })
            })
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| {
                AppError::Database(format!("Failed to inspect columns of {}: {}", name, e))
            })?;

        tables.push(TableSchema { name, columns });
    }

    if tables.is_empty() {
        tracing::warn!(%topic, "Store has no tables");
    }

    Ok(SchemaDescription { topic, tables })
}
