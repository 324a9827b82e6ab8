//! Dataset stores for medassist.
//!
//! Each topic is backed by one SQLite file. This crate reports a store's
//! schema and runs generated SQL against it through a read-only guard.

pub mod guard;
pub mod query;
pub mod schema;
pub mod store;

pub use query::{QueryExecutor, QueryResult, Value};
pub use schema::{ColumnSchema, SchemaDescription, SchemaInspector, TableSchema};
pub use store::SqliteStores;
