//! Prompts command handler.

use clap::Args;
use medassist_core::{config::AppConfig, AppResult};
use medassist_prompt::{list_prompts, PromptOrigin};

/// List available prompt definitions
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing prompts command");

        let listings = list_prompts(&config.workspace)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&listings)?);
            return Ok(());
        }

        for listing in &listings {
            match &listing.origin {
                PromptOrigin::BuiltIn => println!("{}  (built-in)", listing.id),
                PromptOrigin::Workspace(path) => {
                    println!("{}  (workspace: {})", listing.id, path.display())
                }
            }
        }

        Ok(())
    }
}
