//! Session-level errors

use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cardchess_core::GameError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("game is full")]
    GameFull,

    #[error("session {0} not found")]
    SessionNotFound(String),

    #[error("join a game first")]
    NotSeated,

    #[error("already seated in session {0}")]
    AlreadySeated(String),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("session store: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Stable identifier sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::GameFull => "game_full",
            SessionError::SessionNotFound(_) => "session_not_found",
            SessionError::NotSeated => "not_seated",
            SessionError::AlreadySeated(_) => "already_seated",
            SessionError::Game(err) => err.code(),
            SessionError::Store(_) => "store_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            SessionError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            SessionError::GameFull | SessionError::AlreadySeated(_) => StatusCode::CONFLICT,
            SessionError::NotSeated | SessionError::Game(_) => StatusCode::BAD_REQUEST,
            SessionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}
