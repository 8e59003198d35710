//! kinarow CLI - search and learning engine for k-in-a-row games
//!
//! This CLI provides a unified interface for:
//! - Training the Q-learning agent with the parallel curriculum
//! - Asking minimax, MCTS, the rule cascade or a trained model for a move
//! - Inspecting saved models

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kinarow")]
#[command(version, about = "Search and learning engine for k-in-a-row games", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "info", "kinarow=debug")
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a Q-learning agent
    Train(Box<kinarow::cli::commands::train::TrainArgs>),

    /// Suggest a move for a position
    Suggest(kinarow::cli::commands::suggest::SuggestArgs),

    /// Show metadata of a saved model
    Inspect(kinarow::cli::commands::inspect::InspectArgs),
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Train(args) => kinarow::cli::commands::train::execute(*args),
        Commands::Suggest(args) => kinarow::cli::commands::suggest::execute(args),
        Commands::Inspect(args) => kinarow::cli::commands::inspect::execute(args),
    }
}
