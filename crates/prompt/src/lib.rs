//! Prompt system for medassist.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions, three of them built in
//! - Per-workspace overrides under `.medassist/prompts/`
//! - Handlebars template rendering with required-variable checks

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_prompt, list_prompts, load_prompt, BUILTIN_PROMPT_IDS};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptListing,
    PromptOrigin, PromptOutputSpec,
};
