//! medassist CLI
//!
//! Main entry point for the medassist command-line tool.
//! Answers medical questions from local datasets or the web.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{AskCommand, PromptsCommand, RouteCommand, SchemaCommand};
use medassist_core::logging::{self, LogFormat};
use medassist_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// medassist - answer medical questions from datasets or the web
#[derive(Parser, Debug)]
#[command(name = "medassist")]
#[command(about = "Answer medical questions from local datasets or the web", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "MEDASSIST_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "MEDASSIST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Pretty)]
    log_format: LogFormatArg,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (gemini, ollama)
    #[arg(short, long, global = true, env = "MEDASSIST_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "MEDASSIST_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question
    Ask(AskCommand),

    /// Show how a question would be routed, without answering it
    Route(RouteCommand),

    /// Describe a topic's dataset schema
    Schema(SchemaCommand),

    /// List available prompt definitions
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(
        config.log_level.as_deref(),
        config.no_color,
        cli.log_format.into(),
    )?;

    tracing::info!("medassist starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Route(_) => "route",
        Commands::Schema(_) => "schema",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Route(cmd) => cmd.execute(),
        Commands::Schema(cmd) => cmd.execute(&config),
        Commands::Prompts(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_global_flags() {
        let cli = Cli::try_parse_from([
            "medassist",
            "--provider",
            "ollama",
            "ask",
            "How many patients are in the heart dataset?",
            "--show-sql",
        ])
        .unwrap();

        assert_eq!(cli.provider.as_deref(), Some("ollama"));
        match cli.command {
            Commands::Ask(cmd) => {
                assert!(cmd.show_sql);
                assert_eq!(cmd.question, "How many patients are in the heart dataset?");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_log_format() {
        let cli = Cli::try_parse_from(["medassist", "--log-format", "json", "prompts"]).unwrap();
        assert!(matches!(cli.log_format, LogFormatArg::Json));
    }
}
