//! CardChess Core - Rules engine
//!
//! This crate provides the game logic for CardChess:
//! - Board geometry and pieces
//! - Position records (parse, serialize, validate)
//! - Legal move generation and check detection, backed by shakmaty
//! - Card effects (teleport, shield, knight's leap, swap)
//! - Hands, the deck and card-draw eligibility
//! - The turn state machine

pub mod board;
pub mod pieces;
pub mod error;
pub mod position;
pub mod movegen;
pub mod cards;
pub mod hand;
pub mod draw;
pub mod config;
pub mod game;

// Re-exports for convenient access
pub use board::{ParseSquareError, Square};
pub use pieces::{ByColor, Color, Piece, PieceKind};
pub use error::GameError;
pub use position::{Placement, Position, MAX_CLOCK, STARTING_RECORD};
pub use movegen::{GameStatus, Move, MoveKind};
pub use cards::{Card, CardAction, CardKind, Shield};
pub use hand::{Deck, Hand, HandCard, HAND_LIMIT};
pub use draw::DrawReason;
pub use config::RuleConfig;
pub use game::{DrawnCard, Game, GameOutcome, LastAction, PendingCard, Selection, TurnPhase, TurnReport};
