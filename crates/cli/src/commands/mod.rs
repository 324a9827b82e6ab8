//! Command handlers for the medassist CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod prompts;
pub mod route;
pub mod schema;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use prompts::PromptsCommand;
pub use route::RouteCommand;
pub use schema::SchemaCommand;
