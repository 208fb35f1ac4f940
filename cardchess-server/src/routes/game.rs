//! Match and session lookup endpoints

use crate::error::SessionError;
use crate::session::GameView;
use crate::state::ServerState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct MatchResponse {
    pub session_id: String,
    /// False when an existing waiting session was returned
    pub created: bool,
}

/// Return the waiting session, or open a new one
pub async fn find_match(State(state): State<Arc<ServerState>>) -> Json<MatchResponse> {
    let (session_id, created) = state.coordinator.reserve_match();
    Json(MatchResponse { session_id, created })
}

/// Public state of a session
pub async fn get_game(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<GameView>, SessionError> {
    state.coordinator.view(&id).map(Json)
}
