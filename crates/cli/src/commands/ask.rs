//! Ask command handler.
//!
//! Wires the configured LLM, dataset stores and search provider into a
//! router and answers one question.

use clap::Args;
use medassist_agent::{AgentPrompts, Collaborators, ModelSettings, Router};
use medassist_core::{config::AppConfig, AppResult};
use medassist_data::SqliteStores;
use medassist_llm::create_client;
use medassist_search::create_search;
use std::sync::Arc;

/// Ask a question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Output as JSON (answer, route, sql, sources)
    #[arg(long)]
    pub json: bool,

    /// Print the executed SQL before the answer (dataset questions only)
    #[arg(long)]
    pub show_sql: bool,

    /// Maximum tokens in each model response
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Temperature for response generation (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        config.validate()?;
        let router = self.build_router(config)?;

        match router.answer(&self.question).await {
            Ok(answer) => {
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&answer)?);
                    return Ok(());
                }

                if self.show_sql {
                    if let Some(ref sql) = answer.sql {
                        println!("SQL: {}", sql);
                        println!();
                    }
                }
                println!("{}", answer.text);

                if !answer.sources.is_empty() {
                    println!();
                    println!("Sources:");
                    for source in &answer.sources {
                        println!("- {} ({})", source.title, source.url);
                    }
                }
            }
            Err(err) => {
                // Pipeline failures are answers too: the message goes to stdout
                tracing::warn!("Question could not be answered: {}", err);
                if self.json {
                    let output = serde_json::json!({ "error": err.to_string() });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    println!("{}", err);
                }
            }
        }

        Ok(())
    }

    fn build_router(&self, config: &AppConfig) -> AppResult<Router> {
        let provider_config = config.get_provider_config(&config.provider);
        let endpoint = provider_config.as_ref().and_then(|pc| pc.endpoint());
        let timeout = provider_config.as_ref().and_then(|pc| pc.timeout());
        let api_key = config.resolve_api_key(&config.provider);

        let llm = create_client(&config.provider, endpoint, api_key.as_deref(), timeout)?;
        tracing::debug!("Using LLM provider: {}", llm.provider_name());

        let stores = Arc::new(SqliteStores::from_config(config));
        let search_key = config.resolve_search_api_key();
        let search = create_search(&config.search, search_key.as_deref())?;

        let settings = ModelSettings::new(&config.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        let prompts = AgentPrompts::load(&config.workspace)?;

        let router = Router::new(
            Collaborators {
                llm,
                schema: stores.clone(),
                executor: stores,
                search,
            },
            settings,
            prompts,
        )
        .with_max_search_results(config.search.max_results);

        Ok(router)
    }
}
