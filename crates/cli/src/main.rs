//! sabaq CLI
//!
//! Main entry point for the sabaq command-line tool: offline document
//! retrieval and RAG over uploaded curriculum material.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, CollectionsCommand, SearchCommand, UploadCommand};
use sabaq_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// sabaq - offline retrieval and RAG for curriculum content
#[derive(Parser, Debug)]
#[command(name = "sabaq")]
#[command(about = "Offline retrieval and RAG for curriculum content", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "SABAQ_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "SABAQ_CONFIG")]
    config: Option<PathBuf>,

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
    /// Upload and index PDF documents
    Upload(UploadCommand),

    /// Ask a question against an indexed collection
    Ask(AskCommand),

    /// Keyword search over given documents
    Search(SearchCommand),

    /// List persisted collections
    Collections(CollectionsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("sabaq starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Embedding provider: {}", config.embedding.provider);

    config.validate()?;
    config.ensure_data_dir()?;

    let command_name = match &cli.command {
        Commands::Upload(_) => "upload",
        Commands::Ask(_) => "ask",
        Commands::Search(_) => "search",
        Commands::Collections(_) => "collections",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Upload(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Collections(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
