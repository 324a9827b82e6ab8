//! Question router and answer pipeline for medassist.
//!
//! A question is classified by topic and intent, then answered either from a
//! topic's dataset (schema → SQL generation → execution → synthesis) or from
//! the web (search → synthesis).
//!
//! # Example
//! ```no_run
//! use medassist_agent::{AgentPrompts, Collaborators, ModelSettings, Router};
//!
//! # async fn example(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//! let router = Router::new(
//!     collaborators,
//!     ModelSettings::new("gemini-2.5-flash"),
//!     AgentPrompts::builtin()?,
//! );
//! println!("{}", router.ask("What is the average age of patients with heart disease?").await);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod error;
pub mod generator;
pub mod prompts;
pub mod router;
pub mod synthesizer;

#[cfg(test)]
pub(crate) mod test_support;

pub use classify::{Classifier, Intent, Route, TopicRule, DATA_TERMS};
pub use error::AgentError;
pub use generator::{strip_code_fences, QueryGenerator};
pub use prompts::{AgentPrompts, ModelSettings};
pub use router::{Answer, Collaborators, Router, SourceRef, SEARCH_NOT_CONFIGURED};
pub use synthesizer::{AnswerSynthesizer, Evidence, EvidenceKind};
