//! Mes Droits CLI
//!
//! Main entry point for the mes-droits command-line tool. Answers French
//! citizen rights questions grounded in the official publication corpus,
//! and manages the corpus itself.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, DeleteCommand, IngestCommand, SearchCommand};
use mes_droits_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Mes Droits CLI - grounded answers about French citizen rights
#[derive(Parser, Debug)]
#[command(name = "mes-droits")]
#[command(about = "Grounded answers about French citizen rights", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the publication vector store
    #[arg(short, long, global = true, env = "MES_DROITS_STORE")]
    store: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "MES_DROITS_CONFIG")]
    config: Option<PathBuf>,

    /// Chat/embedding endpoint URL
    #[arg(long, global = true, env = "MES_DROITS_ENDPOINT")]
    endpoint: Option<String>,

    /// Chat model identifier
    #[arg(short, long, global = true, env = "MES_DROITS_MODEL")]
    model: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question, answered from the publication corpus
    Ask(AskCommand),

    /// Ingest publications from the corpus parser's JSON output
    Ingest(IngestCommand),

    /// Search the publication corpus directly
    Search(SearchCommand),

    /// Delete a publication by id
    Delete(DeleteCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from file and environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.store,
        cli.config,
        cli.endpoint,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Mes Droits CLI starting");
    tracing::debug!("Store: {:?}", config.store_path);
    tracing::debug!("Provider: {} ({})", config.provider, config.endpoint);
    tracing::debug!("Model: {}", config.model);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Ingest(_) => "ingest",
        Commands::Search(_) => "search",
        Commands::Delete(_) => "delete",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Delete(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
