//! Ghost Cycler - mint / upgrade / claim automation for a fleet of Solana wallets
//!
//! # WARNING
//! - Every action spends real SOL on fees and rent.
//! - The key file holds raw private keys. Keep it `chmod 600`.
//! - The Ghost program is third-party; a redeploy can change its layouts.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use ghost_cycler::cli::commands;
use ghost_cycler::config::Config;

/// Ghost Cycler - walks each wallet through mint, upgrade and claim
#[derive(Parser)]
#[command(name = "ghost-cycler")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (optional; built-in defaults apply without it)
    #[arg(short, long, default_value = "ghost.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the fleet loop until stopped (default)
    Run,

    /// Show every wallet's progression without sending transactions
    Status,

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ghost_cycler=info".parse()?),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let command = cli.command.unwrap_or(Commands::Run);

    if matches!(command, Commands::Run) {
        if let Err(e) = commands::startup_checks(&config) {
            error!("Startup checks failed: {:#}", e);
            std::process::exit(1);
        }
    }

    // Execute command
    let result = match command {
        Commands::Run => commands::run(&config).await,
        Commands::Status => commands::status(&config).await,
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
