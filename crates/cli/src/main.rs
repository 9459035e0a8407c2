//! naix CLI
//!
//! Main entry point for the naix command-line tool.
//! Assembles NovelAI story strings and manages the formatting settings.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AssembleCommand, BlocksCommand, CheckCommand, PolicyCommand, TemplateCommand};
use naix_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// naix - story-string prompt assembly for NovelAI
#[derive(Parser, Debug)]
#[command(name = "naix")]
#[command(about = "Story-string prompt assembly for NovelAI", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "NAIX_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "NAIX_CONFIG")]
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

    /// Selected chat-completion API (novel, openai, kobold, etc.)
    #[arg(short, long, global = true, env = "NAIX_API")]
    api: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble the prompt for a before-combine-prompts request
    Assemble(AssembleCommand),

    /// Check the host's advanced-formatting state
    Check(CheckCommand),

    /// Show, edit or validate the story string
    Template(TemplateCommand),

    /// Manage text blocks
    Blocks(BlocksCommand),

    /// Show or edit the chat formatting flags
    Policy(PolicyCommand),
}

fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.api,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;
    config.validate()?;

    tracing::info!("naix starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Settings: {:?}", config.settings_path());
    tracing::debug!("API: {}", config.main_api);

    let command_name = match &cli.command {
        Commands::Assemble(_) => "assemble",
        Commands::Check(_) => "check",
        Commands::Template(_) => "template",
        Commands::Blocks(_) => "blocks",
        Commands::Policy(_) => "policy",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Assemble(cmd) => cmd.execute(&config),
        Commands::Check(cmd) => cmd.execute(&config),
        Commands::Template(cmd) => cmd.execute(&config),
        Commands::Blocks(cmd) => cmd.execute(&config),
        Commands::Policy(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
