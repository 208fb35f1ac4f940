//! Card definitions and the card effect engine
//!
//! Effects are pure: they take a position and return a new one, or a
//! rejection. The input position is never touched, so a rejected effect
//! leaves the game byte-for-byte where it was.

use crate::board::Square;
use crate::error::GameError;
use crate::pieces::{Color, Piece};
use crate::position::{Placement, Position};
use serde::{Deserialize, Serialize};

// ============================================================================
// CARDS
// ============================================================================

/// Effect printed on a card
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// Move an own piece to any empty square
    Teleport,
    /// Protect an own piece from Knight's Leap captures until the next own turn
    Shield,
    /// Move an own piece like a knight, capturing allowed
    KnightLeap,
    /// Exchange two pieces of the same color
    Swap,
}

impl CardKind {
    pub const ALL: [CardKind; 4] = [
        CardKind::Teleport,
        CardKind::Shield,
        CardKind::KnightLeap,
        CardKind::Swap,
    ];

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            CardKind::Teleport => "Teleportation",
            CardKind::Shield => "Shield",
            CardKind::KnightLeap => "Knight's Leap",
            CardKind::Swap => "Swap Sacrifice",
        }
    }

    /// Squares the player picks to complete the effect
    pub fn selections(self) -> usize {
        match self {
            CardKind::Shield => 1,
            _ => 2,
        }
    }

    /// Whether a successful effect passes the turn
    pub fn ends_turn(self) -> bool {
        self != CardKind::Shield
    }
}

/// A card in a hand
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    pub kind: CardKind,
}

impl Card {
    pub fn new(kind: CardKind) -> Self {
        Self {
            name: kind.name().to_string(),
            kind,
        }
    }
}

/// Active shield: one protected square and the color that owns it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shield {
    pub square: Square,
    pub owner: Color,
}

impl Shield {
    /// True when `square` is protected against `attacker`
    pub fn protects(&self, square: Square, attacker: Color) -> bool {
        self.square == square && self.owner == attacker.opponent()
    }
}

// ============================================================================
// EFFECTS
// ============================================================================

/// A fully selected card effect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum CardAction {
    Teleport { from: Square, to: Square },
    Shield { square: Square },
    KnightLeap { from: Square, to: Square },
    Swap { first: Square, second: Square },
}

impl CardAction {
    pub fn kind(&self) -> CardKind {
        match self {
            CardAction::Teleport { .. } => CardKind::Teleport,
            CardAction::Shield { .. } => CardKind::Shield,
            CardAction::KnightLeap { .. } => CardKind::KnightLeap,
            CardAction::Swap { .. } => CardKind::Swap,
        }
    }

    /// Build the action for `kind` from picked squares
    pub fn from_selection(kind: CardKind, first: Square, second: Option<Square>) -> Option<Self> {
        match (kind, second) {
            (CardKind::Shield, _) => Some(CardAction::Shield { square: first }),
            (CardKind::Teleport, Some(to)) => Some(CardAction::Teleport { from: first, to }),
            (CardKind::KnightLeap, Some(to)) => Some(CardAction::KnightLeap { from: first, to }),
            (CardKind::Swap, Some(second)) => Some(CardAction::Swap { first, second }),
            _ => None,
        }
    }
}

/// Result of a successful effect
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardOutcome {
    pub position: Position,
    pub shield: Option<Shield>,
    pub captured: Option<Piece>,
    pub ends_turn: bool,
}

/// Apply a card effect for `acting` to `position`.
///
/// Turn-ending effects hand the move to the opponent; Shield leaves the side
/// to move alone. Effects that would leave the mover in check fail with
/// `SelfCheck`.
pub fn apply_card(
    position: &Position,
    shield: Option<Shield>,
    acting: Color,
    action: CardAction,
) -> Result<CardOutcome, GameError> {
    if position.side_to_move() != acting {
        return Err(GameError::NotYourTurn);
    }

    match action {
        CardAction::Teleport { from, to } => teleport(position, acting, from, to)
            .map(|next| turn_ending(next, shield, None)),
        CardAction::KnightLeap { from, to } => knight_leap(position, shield, acting, from, to)
            .map(|(next, captured)| turn_ending(next, shield, captured)),
        CardAction::Swap { first, second } => swap(position, first, second)
            .map(|next| turn_ending(next, shield, None)),
        CardAction::Shield { square } => {
            let new_shield = raise_shield(position, acting, square)?;
            Ok(CardOutcome {
                position: position.clone(),
                shield: Some(new_shield),
                captured: None,
                ends_turn: false,
            })
        }
    }
}

fn turn_ending(position: Position, shield: Option<Shield>, captured: Option<Piece>) -> CardOutcome {
    CardOutcome {
        position,
        shield,
        captured,
        ends_turn: true,
    }
}

fn own_piece(position: &Position, acting: Color, square: Square) -> Result<Piece, GameError> {
    position
        .piece_at(square)
        .filter(|p| p.color == acting)
        .ok_or(GameError::NotOwnPiece(square))
}

/// Hand the edited position to the opponent. A mover left in check is
/// `SelfCheck`.
fn hand_off(mut next: Placement) -> Result<Position, GameError> {
    next.force_turn_handoff();
    next.finish()
}

/// Move an own piece to any empty square
pub fn teleport(position: &Position, acting: Color, from: Square, to: Square) -> Result<Position, GameError> {
    let piece = own_piece(position, acting, from)?;
    if from == to {
        return Err(GameError::SameSquare);
    }
    if position.piece_at(to).is_some() {
        return Err(GameError::OccupiedDestination(to));
    }

    let mut next = position.edit();
    next.remove_piece(from);
    next.place_piece(to, piece);
    hand_off(next)
}

/// Move an own piece along a knight's L, capturing an enemy piece on landing
pub fn knight_leap(
    position: &Position,
    shield: Option<Shield>,
    acting: Color,
    from: Square,
    to: Square,
) -> Result<(Position, Option<Piece>), GameError> {
    let piece = own_piece(position, acting, from)?;
    if !from.is_knight_jump(to) {
        return Err(GameError::NotKnightMove { from, to });
    }

    let captured = position.piece_at(to);
    if let Some(target) = captured {
        if target.color == acting {
            return Err(GameError::OccupiedDestination(to));
        }
        if shield.map_or(false, |s| s.protects(to, acting)) {
            return Err(GameError::ShieldBlocked(to));
        }
        if target.is_king() {
            return Err(GameError::KingCapture);
        }
    }

    let mut next = position.edit();
    next.remove_piece(from);
    next.place_piece(to, piece);
    hand_off(next).map(|next| (next, captured))
}

/// Exchange the pieces on two squares for the side to move. Both must share
/// a color; the pair need not belong to the mover.
pub fn swap(position: &Position, first: Square, second: Square) -> Result<Position, GameError> {
    if first == second {
        return Err(GameError::SameSquare);
    }
    let (a, b) = match (position.piece_at(first), position.piece_at(second)) {
        (Some(a), Some(b)) if a.color == b.color => (a, b),
        _ => return Err(GameError::ColorMismatch),
    };
    let mut next = position.edit();
    next.place_piece(first, b);
    next.place_piece(second, a);
    hand_off(next)
}

/// Protect an own piece. Replaces any previous shield.
pub fn raise_shield(position: &Position, acting: Color, square: Square) -> Result<Shield, GameError> {
    own_piece(position, acting, square)?;
    Ok(Shield {
        square,
        owner: acting,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::PieceKind;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn pos(record: &str) -> Position {
        Position::parse(record).unwrap()
    }

    #[test]
    fn test_teleport_flips_turn() {
        let start = Position::starting();
        let action = CardAction::Teleport {
            from: sq("b1"),
            to: sq("e4"),
        };
        let outcome = apply_card(&start, None, Color::White, action).unwrap();
        assert!(outcome.ends_turn);
        assert_eq!(outcome.position.side_to_move(), Color::Black);
        assert_eq!(
            outcome.position.piece_at(sq("e4")),
            Some(Piece::new(PieceKind::Knight, Color::White))
        );
        assert_eq!(outcome.position.piece_at(sq("b1")), None);
    }

    #[test]
    fn test_teleport_requires_empty_destination() {
        let start = Position::starting();
        let result = teleport(&start, Color::White, sq("b1"), sq("e2"));
        assert_eq!(result, Err(GameError::OccupiedDestination(sq("e2"))));
    }

    #[test]
    fn test_teleport_own_piece_only() {
        let start = Position::starting();
        assert_eq!(
            teleport(&start, Color::White, sq("b8"), sq("e4")),
            Err(GameError::NotOwnPiece(sq("b8")))
        );
        assert_eq!(
            teleport(&start, Color::White, sq("e4"), sq("e5")),
            Err(GameError::NotOwnPiece(sq("e4")))
        );
    }

    #[test]
    fn test_teleport_self_check_leaves_position_untouched() {
        // Rook on e2 shields the king from the black rook on e8
        let before = pos("4r1k1/8/8/8/8/8/4R3/4K3 w - - 0 1");
        let record = before.to_record();
        let action = CardAction::Teleport {
            from: sq("e2"),
            to: sq("a4"),
        };
        assert_eq!(
            apply_card(&before, None, Color::White, action),
            Err(GameError::SelfCheck)
        );
        assert_eq!(before.to_record(), record);
    }

    #[test]
    fn test_knight_leap_geometry() {
        let start = Position::starting();
        assert_eq!(
            knight_leap(&start, None, Color::White, sq("e2"), sq("e4")),
            Err(GameError::NotKnightMove {
                from: sq("e2"),
                to: sq("e4")
            })
        );
        let (next, captured) = knight_leap(&start, None, Color::White, sq("e2"), sq("f4")).unwrap();
        assert_eq!(captured, None);
        assert_eq!(
            next.piece_at(sq("f4")),
            Some(Piece::new(PieceKind::Pawn, Color::White))
        );
    }

    #[test]
    fn test_knight_leap_captures() {
        let p = pos("4k3/8/8/3p4/8/4B3/8/4K3 w - - 0 1");
        let action = CardAction::KnightLeap {
            from: sq("e3"),
            to: sq("d5"),
        };
        let outcome = apply_card(&p, None, Color::White, action).unwrap();
        assert_eq!(outcome.captured, Some(Piece::new(PieceKind::Pawn, Color::Black)));
        assert_eq!(
            outcome.position.piece_at(sq("d5")),
            Some(Piece::new(PieceKind::Bishop, Color::White))
        );
    }

    #[test]
    fn test_knight_leap_blocked_by_opponent_shield() {
        let p = pos("4k3/8/8/3p4/8/4B3/8/4K3 w - - 0 1");
        let shield = Some(Shield {
            square: sq("d5"),
            owner: Color::Black,
        });
        let action = CardAction::KnightLeap {
            from: sq("e3"),
            to: sq("d5"),
        };
        assert_eq!(
            apply_card(&p, shield, Color::White, action),
            Err(GameError::ShieldBlocked(sq("d5")))
        );
    }

    #[test]
    fn test_own_shield_does_not_block_self() {
        // A shield owned by the leaper never matters for its own leap
        let p = pos("4k3/8/8/3p4/8/4B3/8/4K3 w - - 0 1");
        let shield = Some(Shield {
            square: sq("d5"),
            owner: Color::White,
        });
        assert!(knight_leap(&p, shield, Color::White, sq("e3"), sq("d5")).is_ok());
    }

    #[test]
    fn test_knight_leap_cannot_land_on_friend_or_king() {
        let start = Position::starting();
        assert_eq!(
            knight_leap(&start, None, Color::White, sq("b1"), sq("d2")),
            Err(GameError::OccupiedDestination(sq("d2")))
        );
        let p = pos("8/8/4k3/8/3B4/8/8/4K3 w - - 0 1");
        assert_eq!(
            knight_leap(&p, None, Color::White, sq("d4"), sq("e6")),
            Err(GameError::KingCapture)
        );
    }

    #[test]
    fn test_shield_never_blocks_teleport_or_swap() {
        let start = Position::starting();
        let shield = Some(Shield {
            square: sq("d2"),
            owner: Color::Black,
        });
        let swap_action = CardAction::Swap {
            first: sq("d2"),
            second: sq("e2"),
        };
        assert!(apply_card(&start, shield, Color::White, swap_action).is_ok());
        let teleport_action = CardAction::Teleport {
            from: sq("d2"),
            to: sq("d5"),
        };
        assert!(apply_card(&start, shield, Color::White, teleport_action).is_ok());
    }

    #[test]
    fn test_swap_same_color_pair() {
        let start = Position::starting();
        let next = swap(&start, sq("d1"), sq("e1")).unwrap();
        assert_eq!(next.piece_at(sq("e1")).map(|p| p.kind), Some(PieceKind::Queen));
        assert_eq!(next.piece_at(sq("d1")).map(|p| p.kind), Some(PieceKind::King));

        // The pair may be the opponent's
        assert!(swap(&start, sq("b8"), sq("c8")).is_ok());
    }

    #[test]
    fn test_swap_rejects_mixed_or_empty() {
        let start = Position::starting();
        assert_eq!(swap(&start, sq("e2"), sq("e7")), Err(GameError::ColorMismatch));
        assert_eq!(swap(&start, sq("e2"), sq("e4")), Err(GameError::ColorMismatch));
        assert_eq!(swap(&start, sq("e2"), sq("e2")), Err(GameError::SameSquare));
    }

    #[test]
    fn test_swap_into_check_reverts() {
        // Swapping the king onto the open e-file walks into the rook
        let p = pos("k3r3/8/8/8/8/8/8/3KB3 w - - 0 1");
        assert_eq!(swap(&p, sq("d1"), sq("e1")), Err(GameError::SelfCheck));
    }

    #[test]
    fn test_swap_revokes_castling() {
        let start = Position::starting();
        let action = CardAction::Swap {
            first: sq("e1"),
            second: sq("d1"),
        };
        let outcome = apply_card(&start, None, Color::White, action).unwrap();
        assert_eq!(outcome.position.to_record().split(' ').nth(2), Some("kq"));
    }

    #[test]
    fn test_shield_keeps_turn() {
        let start = Position::starting();
        let outcome = apply_card(&start, None, Color::White, CardAction::Shield { square: sq("e2") }).unwrap();
        assert!(!outcome.ends_turn);
        assert_eq!(outcome.position, start);
        assert_eq!(
            outcome.shield,
            Some(Shield {
                square: sq("e2"),
                owner: Color::White
            })
        );

        assert_eq!(
            raise_shield(&start, Color::White, sq("e7")),
            Err(GameError::NotOwnPiece(sq("e7")))
        );
    }

    #[test]
    fn test_card_out_of_turn() {
        let start = Position::starting();
        let action = CardAction::Shield { square: sq("e7") };
        assert_eq!(
            apply_card(&start, None, Color::Black, action),
            Err(GameError::NotYourTurn)
        );
    }

    #[test]
    fn test_knight_leap_of_pinned_piece_reverts() {
        // Bishop on e2 is pinned against the king by the rook on e8
        let before = pos("4r1k1/8/8/8/8/8/4B3/4K3 w - - 0 1");
        let action = CardAction::KnightLeap {
            from: sq("e2"),
            to: sq("c3"),
        };
        assert_eq!(
            apply_card(&before, None, Color::White, action),
            Err(GameError::SelfCheck)
        );
        assert_eq!(before.to_record(), "4r1k1/8/8/8/8/8/4B3/4K3 w - - 0 1");
    }

    #[test]
    fn test_pawn_onto_back_rank_is_invalid() {
        let p = pos("4k3/8/8/8/8/8/P7/4K3 w - - 0 1");
        assert!(matches!(
            teleport(&p, Color::White, sq("a2"), sq("a8")),
            Err(GameError::InvalidPlacement(_))
        ));
        assert!(matches!(
            swap(&Position::starting(), sq("a2"), sq("a1")),
            Err(GameError::InvalidPlacement(_))
        ));
    }

    #[test]
    fn test_effect_clears_en_passant_target() {
        let p = pos("4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1");
        assert_eq!(p.en_passant(), Some(sq("e3")));
        let next = teleport(&p, Color::Black, sq("e8"), sq("d8")).unwrap();
        assert_eq!(next.to_record(), "3k4/8/8/8/3pP3/8/8/4K3 w - - 0 1");
    }

    #[test]
    fn test_card_serde_names() {
        let card = Card::new(CardKind::KnightLeap);
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["name"], "Knight's Leap");
        assert_eq!(json["kind"], "knight_leap");
    }
}
