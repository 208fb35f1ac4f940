//! Server command - start the matchmaking and play server
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: configure_server(), start_server()
//! - Level 3: (delegated to cardchess-server crate)
//! - Level 4: configuration validation

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use cardchess_core::RuleConfig;
use cardchess_server::{run_server, ServerConfig};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct ServerArgs {
    /// Port number to listen on
    #[arg(long, default_value = "3000")]
    pub port: u16,

    /// Directory containing the browser client
    #[arg(long, default_value = "public")]
    pub static_dir: PathBuf,

    /// Save session records as JSON files in this directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Shields also stop plain captures, not just Knight's Leap
    #[arg(long)]
    pub strict_shields: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run server command
///
/// 1. Configure server
/// 2. Start server (blocking)
pub fn run(args: ServerArgs) -> Result<()> {
    let config = configure_server(&args)?;

    tracing::info!("Starting CardChess server on port {}", config.port);
    if config.rules.shield_blocks_standard_captures {
        tracing::info!("Shields block standard captures");
    }

    start_server(config)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Configure server from command arguments
fn configure_server(args: &ServerArgs) -> Result<ServerConfig> {
    validate_static_dir(&args.static_dir)?;
    if let Some(dir) = &args.data_dir {
        validate_data_dir(dir)?;
    }

    let rules = if args.strict_shields {
        RuleConfig::strict_shields()
    } else {
        RuleConfig::default()
    };

    Ok(ServerConfig {
        port: args.port,
        static_dir: args.static_dir.to_string_lossy().to_string(),
        data_dir: args.data_dir.clone(),
        rules,
    })
}

/// Start the server (blocking)
fn start_server(config: ServerConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async { run_server(config).await })
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Validate that static directory exists
fn validate_static_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        tracing::warn!(
            "Static directory does not exist: {}. Server will start but may not serve files.",
            path.display()
        );
    } else if !path.is_dir() {
        anyhow::bail!(
            "Static path exists but is not a directory: {}",
            path.display()
        );
    }

    Ok(())
}

/// The data directory is created on demand, but must not be a file
fn validate_data_dir(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        anyhow::bail!("Data path exists but is not a directory: {}", path.display());
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
