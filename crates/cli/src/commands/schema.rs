//! Schema command handler.

use clap::Args;
use medassist_core::{config::AppConfig, AppResult, Topic};
use medassist_data::{SchemaInspector, SqliteStores};

/// Describe a topic's dataset schema
#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Topic whose store to describe (heart, cancer, diabetes)
    pub topic: Topic,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SchemaCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing schema command for topic: {}", self.topic);

        let stores = SqliteStores::from_config(config);
        let schema = stores.describe(self.topic)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&schema)?);
        } else {
            print!("{}", schema);
        }

        Ok(())
    }
}
