//! Position record codec
//!
//! A `Position` is the full board state: placement, side to move, castling
//! rights, en-passant target and the two clocks. It travels between server
//! and clients as a single text record, e.g.
//! `rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq - 1 1`.
//!
//! Records are read and written by `shakmaty`, which also guarantees every
//! `Position` is a legal chess setup. Card effects edit a `Placement` (a
//! scoped copy) and only get a new `Position` back when it validates.

use crate::board::Square;
use crate::error::GameError;
use crate::pieces::{Color, Piece};
use shakmaty::fen::Fen;
use shakmaty::{Board, CastlingMode, Chess, EnPassantMode, FromSetup, Position as _, PositionError, Setup};
use std::fmt;
use std::str::FromStr;

/// Record of the standard starting position
pub const STARTING_RECORD: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Largest half-move clock or full-move number a record may carry
pub const MAX_CLOCK: u32 = u32::MAX / 2;

/// Full board state
#[derive(Clone, Debug)]
pub struct Position {
    chess: Chess,
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.to_record() == other.to_record()
    }
}

impl Eq for Position {}

impl Position {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// The standard starting position
    pub fn starting() -> Self {
        Self {
            chess: Chess::default(),
        }
    }

    /// Parse and validate a position record
    pub fn parse(text: &str) -> Result<Self, GameError> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(malformed(format!(
                "expected 4 to 6 fields, found {}",
                fields.len()
            )));
        }

        let fen = fields
            .join(" ")
            .parse::<Fen>()
            .map_err(|err| malformed(err.to_string()))?;

        // Card effects can leave checks no game of chess reaches, and flags
        // whose king or rook is not home are simply dropped
        let chess = fen
            .into_position::<Chess>(CastlingMode::Standard)
            .or_else(PositionError::ignore_invalid_castling_rights)
            .or_else(PositionError::ignore_impossible_check)
            .map_err(|err| malformed(err.to_string()))?;

        if chess.halfmoves() > MAX_CLOCK || chess.fullmoves().get() > MAX_CLOCK {
            return Err(malformed(format!("clock beyond {MAX_CLOCK}")));
        }
        Ok(Self { chess })
    }

    /// Serialize to the record form. The en-passant field is only filled
    /// when a capture there is actually legal.
    pub fn to_record(&self) -> String {
        Fen::from_position(self.chess.clone(), EnPassantMode::Legal).to_string()
    }

    pub(crate) fn from_chess(chess: Chess) -> Self {
        Self { chess }
    }

    pub(crate) fn as_chess(&self) -> &Chess {
        &self.chess
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.chess.board().piece_at(square.into()).map(Piece::from)
    }

    pub fn side_to_move(&self) -> Color {
        self.chess.turn().into()
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.chess.ep_square(EnPassantMode::Legal).map(Square::from)
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.chess.halfmoves()
    }

    pub fn fullmove_number(&self) -> u32 {
        self.chess.fullmoves().get()
    }

    /// Occupied squares
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        let board = self.chess.board();
        board
            .occupied()
            .into_iter()
            .filter_map(move |sq| board.piece_at(sq).map(|p| (Square::from(sq), Piece::from(p))))
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.chess.board().king_of(color.into()).map(Square::from)
    }

    /// Same placement and side to move; clocks and flags may differ
    pub fn same_arrangement(&self, other: &Position) -> bool {
        self.chess.board() == other.chess.board() && self.chess.turn() == other.chess.turn()
    }

    // ========================================================================
    // MUTATION
    // ========================================================================

    /// Scoped copy to place and remove pieces on. Nothing is checked until
    /// `Placement::finish`.
    pub fn edit(&self) -> Placement {
        Placement {
            setup: self.chess.clone().into_setup(EnPassantMode::Legal),
        }
    }

    /// Pass the move to the other side without moving a piece.
    ///
    /// Only the side to move and the en-passant target change. Fails with
    /// `SelfCheck` when the side handing off is in check.
    pub fn force_turn_handoff(&self) -> Result<Position, GameError> {
        let mut next = self.edit();
        next.force_turn_handoff();
        next.finish()
    }
}

impl FromStr for Position {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::parse(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_record())
    }
}

// ============================================================================
// PLACEMENT
// ============================================================================

/// A position being edited by a card effect
#[derive(Clone, Debug)]
pub struct Placement {
    setup: Setup,
}

impl Placement {
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.setup.board.piece_at(square.into()).map(Piece::from)
    }

    /// Put a piece on a square, returning what was there
    pub fn place_piece(&mut self, square: Square, piece: Piece) -> Option<Piece> {
        let previous = self.remove_piece(square);
        self.setup.board.set_piece_at(square.into(), piece.into());
        previous
    }

    pub fn remove_piece(&mut self, square: Square) -> Option<Piece> {
        self.setup.board.remove_piece_at(square.into()).map(Piece::from)
    }

    /// Flip the side to move and clear the en-passant target
    pub fn force_turn_handoff(&mut self) {
        self.setup.turn = self.setup.turn.other();
        self.setup.ep_square = None;
    }

    /// Validate the edit.
    ///
    /// The side not to move may not be left in check (`SelfCheck`); other
    /// placements chess can't represent, like a pawn on a back rank, are
    /// `InvalidPlacement`. Castling flags whose king or rook left home are
    /// dropped.
    pub fn finish(self) -> Result<Position, GameError> {
        if king_attacked(&self.setup.board, self.setup.turn.other()) {
            return Err(GameError::SelfCheck);
        }
        Chess::from_setup(self.setup, CastlingMode::Standard)
            .or_else(PositionError::ignore_invalid_castling_rights)
            .or_else(PositionError::ignore_invalid_ep_square)
            .or_else(PositionError::ignore_impossible_check)
            .map(Position::from_chess)
            .map_err(|err| GameError::InvalidPlacement(err.to_string()))
    }
}

/// True when `color` has a king and it stands attacked. A missing king is
/// never in check.
pub(crate) fn king_attacked(board: &Board, color: shakmaty::Color) -> bool {
    board.king_of(color).map_or(false, |king| {
        board
            .attacks_to(king, color.other(), board.occupied())
            .any()
    })
}

fn malformed(reason: String) -> GameError {
    GameError::MalformedPosition(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::PieceKind;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn castling_field(position: &Position) -> String {
        position.to_record().split(' ').nth(2).unwrap().to_string()
    }

    #[test]
    fn test_starting_record() {
        assert_eq!(Position::starting().to_record(), STARTING_RECORD);
        assert_eq!(Position::parse(STARTING_RECORD).unwrap(), Position::starting());
    }

    #[test]
    fn test_record_fields_survive() {
        let text = "r3k2r/8/8/8/3pP3/8/8/R3K2R b Kq e3 7 42";
        let pos = Position::parse(text).unwrap();
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.en_passant(), Some(sq("e3")));
        assert_eq!(pos.halfmove_clock(), 7);
        assert_eq!(pos.fullmove_number(), 42);
        assert_eq!(castling_field(&pos), "Kq");
        assert_eq!(pos.to_record(), text);
    }

    #[test]
    fn test_missing_clocks_default() {
        let pos = Position::parse("4k3/8/8/8/8/8/8/4K3 w - -").unwrap();
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.fullmove_number(), 1);
    }

    #[test]
    fn test_malformed_records() {
        for bad in [
            "",
            "8/8/8/8/8/8/8/8 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K3 x - - 0 1",
            "4k3/8/8/8/8/8/8/4K3X w - - 0 1",
            "4k3/8/8/8/8/8/8 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - e4 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - - x 1",
            "4kk2/8/8/8/8/8/8/4K3 w - - 0 1",
            "P3k3/8/8/8/8/8/8/4K3 w - - 0 1",
        ] {
            assert!(
                matches!(Position::parse(bad), Err(GameError::MalformedPosition(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_clock_range() {
        for bad in [
            "4k3/8/8/8/8/8/8/R3K3 w - - 4294967295 1",
            "4k3/8/8/8/8/8/8/R3K3 b - - 0 4294967295",
        ] {
            assert!(
                matches!(Position::parse(bad), Err(GameError::MalformedPosition(_))),
                "accepted {bad:?}"
            );
        }
        let edge = format!("4k3/8/8/8/8/8/8/R3K3 b - - {MAX_CLOCK} {MAX_CLOCK}");
        assert_eq!(Position::parse(&edge).unwrap().halfmove_clock(), MAX_CLOCK);
    }

    #[test]
    fn test_side_not_to_move_in_check_rejected() {
        // Black king attacked by the rook while white is to move
        let result = Position::parse("4k3/8/8/8/8/8/8/4RK2 w - - 0 1");
        assert!(matches!(result, Err(GameError::MalformedPosition(_))));
        assert!(Position::parse("4k3/8/8/8/8/8/8/4RK2 b - - 0 1").is_ok());
    }

    #[test]
    fn test_en_passant_only_when_capturable() {
        // No black pawn can take on e3, so the field is dropped
        let pos = Position::parse("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        assert_eq!(pos.en_passant(), None);
        assert_eq!(
            pos.to_record(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_place_and_remove() {
        let mut edit = Position::starting().edit();
        let pawn = edit.remove_piece(sq("e2")).unwrap();
        assert_eq!(edit.piece_at(sq("e2")), None);
        assert_eq!(edit.place_piece(sq("e4"), pawn), None);
        assert_eq!(edit.place_piece(sq("e4"), pawn), Some(pawn));
        edit.force_turn_handoff();

        let next = edit.finish().unwrap();
        assert_eq!(next.piece_at(sq("e4")), Some(pawn));
        assert_eq!(next.side_to_move(), Color::Black);
    }

    #[test]
    fn test_force_turn_handoff_touches_only_side_and_en_passant() {
        let pos = Position::parse("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 3").unwrap();
        assert_eq!(pos.en_passant(), Some(sq("e3")));
        let next = pos.force_turn_handoff().unwrap();
        assert_eq!(
            next.to_record(),
            "rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3"
        );
    }

    #[test]
    fn test_handoff_while_in_check_rejected() {
        let pos = Position::parse("4k3/8/8/8/8/8/8/r3K3 w - - 0 1").unwrap();
        assert_eq!(pos.force_turn_handoff(), Err(GameError::SelfCheck));
    }

    #[test]
    fn test_displaced_castling_revoked() {
        let mut edit = Position::starting().edit();
        edit.remove_piece(sq("h1"));
        edit.place_piece(sq("h4"), Piece::new(PieceKind::Rook, Color::White));
        edit.force_turn_handoff();
        let next = edit.finish().unwrap();
        assert_eq!(castling_field(&next), "Qkq");
    }

    #[test]
    fn test_pawn_on_back_rank_is_invalid_placement() {
        let mut edit = Position::starting().edit();
        let pawn = edit.remove_piece(sq("a2")).unwrap();
        edit.place_piece(sq("a1"), pawn);
        edit.force_turn_handoff();
        assert!(matches!(edit.finish(), Err(GameError::InvalidPlacement(_))));
    }
}
