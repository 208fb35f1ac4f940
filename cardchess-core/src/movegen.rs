//! Standard chess legality: attacks, move generation and move application
//!
//! Move generation and check detection come from `shakmaty`; this module
//! describes its moves in the crate's own types.

use crate::board::Square;
use crate::error::GameError;
use crate::pieces::{Color, Piece, PieceKind};
use crate::position::{king_attacked, Position};
use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Position as _, Role};

// ============================================================================
// CORE TYPES
// ============================================================================

/// What kind of standard move this is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Quiet,
    DoublePush,
    Capture,
    EnPassant,
    CastleKingside,
    CastleQueenside,
}

/// A standard chess move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    /// Landing square of the moving piece (the king's, for castling)
    pub to: Square,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub promotion: Option<PieceKind>,
    pub kind: MoveKind,
}

impl Move {
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_castle(&self) -> bool {
        matches!(self.kind, MoveKind::CastleKingside | MoveKind::CastleQueenside)
    }

    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    /// Square the captured piece stood on
    pub fn captured_square(&self) -> Option<Square> {
        match self.kind {
            MoveKind::EnPassant => Square::new(self.to.file(), self.from.rank()),
            _ if self.is_capture() => Some(self.to),
            _ => None,
        }
    }

    /// Coordinate notation, e.g. `e7e8q`
    pub fn to_uci(&self) -> String {
        match self.promotion {
            Some(kind) => format!("{}{}{}", self.from, self.to, kind.letter()),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

/// Outcome of a position for the side to move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
}

// ============================================================================
// ATTACKS
// ============================================================================

/// Squares the piece on `from` attacks (including occupied ones)
pub fn attacks_from(position: &Position, from: Square) -> Vec<Square> {
    position
        .as_chess()
        .board()
        .attacks_from(from.into())
        .into_iter()
        .map(Square::from)
        .collect()
}

/// True when any piece of `by` attacks `square`
pub fn is_square_attacked(position: &Position, square: Square, by: Color) -> bool {
    let board = position.as_chess().board();
    board
        .attacks_to(square.into(), by.into(), board.occupied())
        .any()
}

/// True when `color`'s king is attacked
pub fn is_in_check(position: &Position, color: Color) -> bool {
    king_attacked(position.as_chess().board(), color.into())
}

/// Number of `color`'s pieces standing on squares the opponent attacks
pub fn threatened_count(position: &Position, color: Color) -> usize {
    position
        .pieces()
        .filter(|&(sq, p)| p.color == color && is_square_attacked(position, sq, color.opponent()))
        .count()
}

// ============================================================================
// MOVE GENERATION
// ============================================================================

/// All legal moves for the side to move
pub fn legal_moves(position: &Position) -> Vec<Move> {
    legal_pairs(position).into_iter().map(|(_, mv)| mv).collect()
}

/// Legal moves of the piece on `from`
pub fn legal_moves_from(position: &Position, from: Square) -> Vec<Move> {
    legal_moves(position)
        .into_iter()
        .filter(|mv| mv.from == from)
        .collect()
}

/// Legal moves next to the generator's own move, for playing them back
fn legal_pairs(position: &Position) -> Vec<(shakmaty::Move, Move)> {
    let chess = position.as_chess();
    chess
        .legal_moves()
        .into_iter()
        .filter_map(|raw| describe(chess, &raw).map(|mv| (raw, mv)))
        .collect()
}

fn describe(chess: &Chess, raw: &shakmaty::Move) -> Option<Move> {
    let mover: Color = chess.turn().into();
    let enemy = |role: Role| Piece::new(role.into(), mover.opponent());

    let mv = match *raw {
        shakmaty::Move::Normal {
            role,
            from,
            capture,
            to,
            promotion,
        } => {
            let (from, to) = (Square::from(from), Square::from(to));
            let kind = if capture.is_some() {
                MoveKind::Capture
            } else if role == Role::Pawn && (to.rank() - from.rank()).abs() == 2 {
                MoveKind::DoublePush
            } else {
                MoveKind::Quiet
            };
            Move {
                from,
                to,
                piece: Piece::new(role.into(), mover),
                captured: capture.map(enemy),
                promotion: promotion.map(PieceKind::from),
                kind,
            }
        }
        shakmaty::Move::EnPassant { from, to } => Move {
            from: from.into(),
            to: to.into(),
            piece: Piece::new(PieceKind::Pawn, mover),
            captured: Some(enemy(Role::Pawn)),
            promotion: None,
            kind: MoveKind::EnPassant,
        },
        // The generator names the rook's square; report where the king lands
        shakmaty::Move::Castle { king, rook } => {
            let (king, rook) = (Square::from(king), Square::from(rook));
            let kingside = rook.file() > king.file();
            Move {
                from: king,
                to: Square::new(if kingside { 6 } else { 2 }, king.rank())?,
                piece: Piece::new(PieceKind::King, mover),
                captured: None,
                promotion: None,
                kind: if kingside {
                    MoveKind::CastleKingside
                } else {
                    MoveKind::CastleQueenside
                },
            }
        }
        shakmaty::Move::Put { .. } => return None,
    };
    Some(mv)
}

fn play(position: &Position, raw: &shakmaty::Move) -> Position {
    let mut chess = position.as_chess().clone();
    chess.play_unchecked(raw);
    Position::from_chess(chess)
}

// ============================================================================
// APPLY MOVE
// ============================================================================

/// Validate and apply a standard move.
///
/// A pawn reaching the last rank without an explicit promotion becomes a
/// queen. A promotion piece on a non-promoting move is ignored.
pub fn apply_standard_move(
    position: &Position,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
) -> Result<(Position, Move), GameError> {
    let wanted = promotion.unwrap_or(PieceKind::Queen);
    let (raw, mv) = legal_pairs(position)
        .into_iter()
        .find(|(_, mv)| mv.from == from && mv.to == to && mv.promotion.map_or(true, |p| p == wanted))
        .ok_or(GameError::IllegalMove)?;
    Ok((play(position, &raw), mv))
}

/// Find the legal move that turns `prev` into `next`.
///
/// Only placement and side to move are compared.
pub fn find_transition(prev: &Position, next: &Position) -> Option<Move> {
    legal_pairs(prev)
        .into_iter()
        .find(|(raw, _)| play(prev, raw).same_arrangement(next))
        .map(|(_, mv)| mv)
}

/// Checkmate / stalemate detection for the side to move
pub fn status(position: &Position) -> GameStatus {
    let chess = position.as_chess();
    if chess.is_checkmate() {
        GameStatus::Checkmate {
            winner: Color::from(chess.turn()).opponent(),
        }
    } else if chess.is_stalemate() {
        GameStatus::Stalemate
    } else {
        GameStatus::Ongoing
    }
}

// ============================================================================
// TESTS
// ============================================================================
