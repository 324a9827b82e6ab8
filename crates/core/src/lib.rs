//! Medassist Core Library
//!
//! This crate provides the foundational utilities shared by every medassist crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - The fixed set of dataset topics

pub mod config;
pub mod error;
pub mod logging;
pub mod topic;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use topic::Topic;
