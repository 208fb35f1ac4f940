//! Rejections produced by the rules and the turn machine
//!
//! Every variant leaves the game exactly as it was before the rejected
//! action.

use crate::board::Square;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("malformed position record: {0}")]
    MalformedPosition(String),

    #[error("resulting placement is not a chess position: {0}")]
    InvalidPlacement(String),

    #[error("illegal move")]
    IllegalMove,

    #[error("destination {0} is occupied")]
    OccupiedDestination(Square),

    #[error("squares must hold two pieces of the same color")]
    ColorMismatch,

    #[error("no piece of yours on {0}")]
    NotOwnPiece(Square),

    #[error("the piece on {0} is shielded")]
    ShieldBlocked(Square),

    #[error("that would leave your king in check")]
    SelfCheck,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("you can only play one card per turn")]
    AlreadyPlayedCard,

    #[error("newly drawn cards can't be used until your next turn")]
    NewlyDrawnCard,

    #[error("no card at hand index {0}")]
    NoSuchCard(usize),

    #[error("{from} to {to} is not a knight's leap")]
    NotKnightMove { from: Square, to: Square },

    #[error("pick two different squares")]
    SameSquare,

    #[error("kings cannot be captured")]
    KingCapture,

    #[error("card {index} is a {kind} card")]
    CardMismatch { index: usize, kind: &'static str },

    #[error("no card action is pending")]
    NoPendingCard,

    #[error("finish or cancel the pending card action first")]
    CardSelectionPending,

    #[error("waiting for an opponent")]
    GameNotStarted,

    #[error("the game is over")]
    GameOver,
}

impl GameError {
    /// Stable identifier sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            GameError::MalformedPosition(_) => "malformed_position",
            GameError::InvalidPlacement(_) => "invalid_placement",
            GameError::IllegalMove => "illegal_move",
            GameError::OccupiedDestination(_) => "occupied_destination",
            GameError::ColorMismatch => "color_mismatch",
            GameError::NotOwnPiece(_) => "not_own_piece",
            GameError::ShieldBlocked(_) => "shield_blocked",
            GameError::SelfCheck => "self_check",
            GameError::NotYourTurn => "not_your_turn",
            GameError::AlreadyPlayedCard => "already_played_card",
            GameError::NewlyDrawnCard => "newly_drawn_card",
            GameError::NoSuchCard(_) => "no_such_card",
            GameError::NotKnightMove { .. } => "not_knight_move",
            GameError::SameSquare => "same_square",
            GameError::KingCapture => "king_capture",
            GameError::CardMismatch { .. } => "card_mismatch",
            GameError::NoPendingCard => "no_pending_card",
            GameError::CardSelectionPending => "card_selection_pending",
            GameError::GameNotStarted => "game_not_started",
            GameError::GameOver => "game_over",
        }
    }
}
