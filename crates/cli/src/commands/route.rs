//! Route command handler.
//!
//! Classifies a question locally; no model, store or network access.

use clap::Args;
use medassist_agent::Classifier;
use medassist_core::AppResult;

/// Show how a question would be routed
#[derive(Args, Debug)]
pub struct RouteCommand {
    /// The question to classify
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RouteCommand {
    pub fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing route command");

        let route = Classifier::default().classify(&self.question);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&route)?);
        } else {
            let topic = route.topic.map(|t| t.as_str()).unwrap_or("none");
            println!("Topic: {}", topic);
            println!("Intent: {:?}", route.intent);
            match route.dataset() {
                Some(dataset) => println!("Answered from: {} dataset", dataset),
                None => println!("Answered from: web search"),
            }
        }

        Ok(())
    }
}
