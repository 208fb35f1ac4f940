//! CardChess Server - Matchmaking and live play
//!
//! This crate provides the web backend:
//! - WebSocket endpoint for matchmaking and moves
//! - REST API for match lookup and session state
//! - Static file serving for the browser client
//! - Session persistence

mod routes;
mod state;

pub mod coordinator;
pub mod error;
pub mod protocol;
pub mod session;
pub mod store;

use axum::{
    routing::{get, post},
    Router,
};
use cardchess_core::RuleConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

pub use coordinator::{ConnectionContext, Coordinator};
pub use error::SessionError;
pub use protocol::{ClientMessage, ServerMessage};
pub use session::GameView;
pub use state::ServerState;
pub use store::{JsonFileStore, MemoryStore, SessionRecord, SessionStore};

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: String,
    /// Where session records are written; memory only when unset
    pub data_dir: Option<PathBuf>,
    pub rules: RuleConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            static_dir: "public".to_string(),
            data_dir: None,
            rules: RuleConfig::default(),
        }
    }
}

/// Create the router with all routes
pub fn create_router(config: &ServerConfig, state: Arc<ServerState>) -> Router {
    let static_service = ServeDir::new(&config.static_dir);

    Router::new()
        // Status endpoint
        .route("/api/status", get(routes::status::status_handler))
        // Matchmaking and session lookup
        .route("/api/match", post(routes::game::find_match))
        .route("/api/game/{id}", get(routes::game::get_game))
        // Live play
        .route("/ws", get(routes::ws::ws_handler))
        // Shared state
        .with_state(state)
        .layer(CorsLayer::permissive())
        // Static file serving (must be last)
        .fallback_service(static_service)
}

/// Start the HTTP server
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(ServerState::from_config(&config)?);
    let router = create_router(&config, state);

    tracing::info!("CardChess server starting on http://0.0.0.0:{}", config.port);
    tracing::info!("Static files served from: {}", config.static_dir);
    match &config.data_dir {
        Some(dir) => tracing::info!("Session records saved to: {}", dir.display()),
        None => tracing::info!("Session records kept in memory"),
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
