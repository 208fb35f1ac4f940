//! CardChess CLI - Command-line interface
//!
//! Commands:
//! - serve: Start the matchmaking and play server
//! - inspect: Validate a position record and list its legal moves

mod inspect;
mod server;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cardchess")]
#[command(about = "Two-player chess with cards, served over WebSockets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve(server::ServerArgs),
    /// Check a position record
    Inspect(inspect::InspectArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => server::run(args),
        Commands::Inspect(args) => inspect::run(args),
    }
}
