//! Card-draw eligibility
//!
//! A completed plain move (or a skip) earns one card when any of these hold:
//! check, promotion, castling, capture, skip, defending, forking, pinning.
//! Several reasons still earn a single card.

use crate::movegen::{self, Move};
use crate::pieces::Color;
use crate::position::Position;
use serde::{Deserialize, Serialize};

/// Why a card was earned
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    Check,
    Promotion,
    Castle,
    Capture,
    Skip,
    Defending,
    Forking,
    Pinning,
}

impl DrawReason {
    pub fn describe(self) -> &'static str {
        match self {
            DrawReason::Check => "putting opponent in check",
            DrawReason::Promotion => "promoting a pawn",
            DrawReason::Castle => "castling",
            DrawReason::Capture => "capturing a piece",
            DrawReason::Skip => "skipping turn",
            DrawReason::Defending => "defending a threatened piece",
            DrawReason::Forking => "creating a fork",
            DrawReason::Pinning => "pinning an opponent's piece",
        }
    }
}

/// Reasons the move `mv` (played from `before`, reaching `after`) earns a card
pub fn move_reasons(before: &Position, mv: &Move, after: &Position) -> Vec<DrawReason> {
    let mover = mv.piece.color;
    let mut reasons = Vec::new();

    if movegen::is_in_check(after, mover.opponent()) {
        reasons.push(DrawReason::Check);
    }
    if mv.is_promotion() {
        reasons.push(DrawReason::Promotion);
    }
    if mv.is_castle() {
        reasons.push(DrawReason::Castle);
    }
    if mv.is_capture() {
        reasons.push(DrawReason::Capture);
    }
    if is_defending(before, after, mover) {
        reasons.push(DrawReason::Defending);
    }
    if is_forking(after, mv) {
        reasons.push(DrawReason::Forking);
    }
    if is_pinning(after, mv) {
        reasons.push(DrawReason::Pinning);
    }
    reasons
}

/// A skip always earns a card
pub fn skip_reasons() -> Vec<DrawReason> {
    vec![DrawReason::Skip]
}

/// Fewer of the mover's pieces stand attacked after the move
fn is_defending(before: &Position, after: &Position, mover: Color) -> bool {
    movegen::threatened_count(after, mover) < movegen::threatened_count(before, mover)
}

/// The moved piece now attacks two or more opposing pieces
fn is_forking(after: &Position, mv: &Move) -> bool {
    let mover = mv.piece.color;
    movegen::attacks_from(after, mv.to)
        .into_iter()
        .filter(|&sq| after.piece_at(sq).map_or(false, |p| p.color != mover))
        .count()
        >= 2
}

/// Lifting the moved piece off the board would give the opponent more
/// legal moves. Approximates pins by the mover's effect on mobility.
fn is_pinning(after: &Position, mv: &Move) -> bool {
    let piece = match after.piece_at(mv.to) {
        Some(p) if !p.is_king() => p,
        _ => return false,
    };
    debug_assert_eq!(piece.color, mv.piece.color);

    // Lifting a piece that shields the mover's own king is not a pin
    let mut lifted = after.edit();
    lifted.remove_piece(mv.to);
    lifted.finish().map_or(false, |lifted| {
        movegen::legal_moves(&lifted).len() > movegen::legal_moves(after).len()
    })
}
