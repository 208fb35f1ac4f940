//! Turn and draw-eligibility state machine
//!
//! `Game` owns everything that changes during play: the position, both
//! hands, the active shield, the "card played this turn" flag and the turn
//! phase. Every operation validates against a scratch copy first and only
//! commits on success.

use crate::board::Square;
use crate::cards::{apply_card, Card, CardAction, CardKind, Shield};
use crate::config::RuleConfig;
use crate::draw::{self, DrawReason};
use crate::error::GameError;
use crate::hand::{Deck, Hand};
use crate::movegen::{self, GameStatus, Move, MoveKind};
use crate::pieces::{ByColor, Color, PieceKind};
use crate::position::Position;
use serde::{Deserialize, Serialize};

// ============================================================================
// CORE TYPES
// ============================================================================

/// How a finished game ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum GameOutcome {
    Checkmate { winner: Color },
    Stalemate,
}

impl GameOutcome {
    pub fn winner(&self) -> Option<Color> {
        match self {
            GameOutcome::Checkmate { winner } => Some(*winner),
            GameOutcome::Stalemate => None,
        }
    }
}

/// A two-click card effect waiting for its squares
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCard {
    pub color: Color,
    pub index: usize,
    pub kind: CardKind,
    pub selection: Option<Square>,
}

/// Where the turn cycle stands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TurnPhase {
    WaitingForOpponent,
    AwaitingMove { color: Color },
    CardActionPending(PendingCard),
    GameOver { outcome: GameOutcome },
}

/// What the acting player just did
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LastAction {
    Move {
        uci: String,
        kind: MoveKind,
        captured: bool,
    },
    Card {
        kind: CardKind,
        effect: CardAction,
        captured: bool,
    },
    Skip,
}

/// A card earned by a move or skip
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawnCard {
    pub card: Card,
    pub reasons: Vec<DrawReason>,
}

/// Result of a committed action, for broadcasting
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReport {
    pub actor: Color,
    pub action: LastAction,
    /// Card added to the actor's hand, if any
    pub drawn: Option<DrawnCard>,
    /// True when the turn passed to the opponent
    pub turn_passed: bool,
    pub outcome: Option<GameOutcome>,
}

/// Result of picking a square for a pending card
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// First square recorded, waiting for the second
    Pending(PendingCard),
    /// Effect applied
    Completed(TurnReport),
}

// ============================================================================
// GAME
// ============================================================================

/// Authoritative state of one match
#[derive(Clone, Debug)]
pub struct Game {
    position: Position,
    hands: ByColor<Hand>,
    shield: Option<Shield>,
    card_played: bool,
    phase: TurnPhase,
    deck: Deck,
    rules: RuleConfig,
}

impl Game {
    /// New game on the standard starting position, waiting for black to join
    pub fn new(rules: RuleConfig, deck: Deck) -> Self {
        Self::from_position(Position::starting(), rules, deck)
    }

    /// New game on an arbitrary position; nothing happens until `start`
    pub fn from_position(position: Position, rules: RuleConfig, deck: Deck) -> Self {
        Self {
            position,
            hands: ByColor::default(),
            shield: None,
            card_played: false,
            phase: TurnPhase::WaitingForOpponent,
            deck,
            rules,
        }
    }

    /// Both seats are filled: the side to move takes its first turn
    pub fn start(&mut self) -> Result<Color, GameError> {
        if self.phase != TurnPhase::WaitingForOpponent {
            return Ok(self.position.side_to_move());
        }
        let first = self.position.side_to_move();
        self.begin_turn(first);
        if let Some(outcome) = self.check_outcome() {
            self.phase = TurnPhase::GameOver { outcome };
        }
        Ok(first)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn hand(&self, color: Color) -> &Hand {
        &self.hands[color]
    }

    pub fn shield(&self) -> Option<Shield> {
        self.shield
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn rules(&self) -> RuleConfig {
        self.rules
    }

    pub fn card_played_this_turn(&self) -> bool {
        self.card_played
    }

    /// Color whose turn it is, if the game is running
    pub fn turn(&self) -> Option<Color> {
        match self.phase {
            TurnPhase::AwaitingMove { color } => Some(color),
            TurnPhase::CardActionPending(pending) => Some(pending.color),
            _ => None,
        }
    }

    pub fn pending_card(&self) -> Option<PendingCard> {
        match self.phase {
            TurnPhase::CardActionPending(pending) => Some(pending),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.phase {
            TurnPhase::GameOver { outcome } => Some(outcome),
            _ => None,
        }
    }

    // ========================================================================
    // PLAIN MOVES
    // ========================================================================

    /// Play a standard chess move for `color`
    pub fn play_move(
        &mut self,
        color: Color,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<TurnReport, GameError> {
        self.require_free_turn(color)?;

        let before = &self.position;
        let (after, mv) = movegen::apply_standard_move(before, from, to, promotion)?;
        self.check_standard_capture(&mv)?;

        let reasons = draw::move_reasons(before, &mv, &after);
        self.position = after;
        let drawn = self.award(color, reasons);
        let outcome = self.end_turn(color);

        Ok(TurnReport {
            actor: color,
            action: LastAction::Move {
                uci: mv.to_uci(),
                kind: mv.kind,
                captured: mv.is_capture(),
            },
            drawn,
            turn_passed: true,
            outcome,
        })
    }

    /// Accept a full position record as the client's move.
    ///
    /// The record's side to move must be the submitter's opponent, and the
    /// placement must follow from the current position by one legal move.
    pub fn submit_position(&mut self, color: Color, record: &str) -> Result<TurnReport, GameError> {
        let next = Position::parse(record)?;
        self.require_free_turn(color)?;
        if next.side_to_move() != color.opponent() {
            return Err(GameError::NotYourTurn);
        }
        let mv = movegen::find_transition(&self.position, &next).ok_or(GameError::IllegalMove)?;
        self.play_move(color, mv.from, mv.to, mv.promotion)
    }

    /// Pass the turn without moving. Always earns a card.
    pub fn skip_turn(&mut self, color: Color) -> Result<TurnReport, GameError> {
        self.require_free_turn(color)?;
        if self.card_played {
            return Err(GameError::AlreadyPlayedCard);
        }
        // Fails with SelfCheck while the skipper is in check
        let next = self.position.force_turn_handoff()?;

        let drawn = self.award(color, draw::skip_reasons());
        self.position = next;
        let outcome = self.end_turn(color);

        Ok(TurnReport {
            actor: color,
            action: LastAction::Skip,
            drawn,
            turn_passed: true,
            outcome,
        })
    }

    // ========================================================================
    // CARDS
    // ========================================================================

    /// Arm the card at `index`, replacing any pending card
    pub fn activate_card(&mut self, color: Color, index: usize) -> Result<PendingCard, GameError> {
        self.require_turn(color)?;
        if self.card_played {
            return Err(GameError::AlreadyPlayedCard);
        }
        let kind = self.hands[color].playable(index)?.kind;

        let pending = PendingCard {
            color,
            index,
            kind,
            selection: None,
        };
        self.phase = TurnPhase::CardActionPending(pending);
        Ok(pending)
    }

    /// Pick the next square for the pending card
    pub fn select_square(&mut self, color: Color, square: Square) -> Result<Selection, GameError> {
        self.require_turn(color)?;
        let mut pending = self.pending_card().ok_or(GameError::NoPendingCard)?;

        let (first, second) = match pending.selection {
            Some(first) => (first, Some(square)),
            None if pending.kind.selections() == 1 => (square, None),
            None => {
                self.check_first_selection(pending.kind, color, square)?;
                pending.selection = Some(square);
                self.phase = TurnPhase::CardActionPending(pending);
                return Ok(Selection::Pending(pending));
            }
        };

        let action = CardAction::from_selection(pending.kind, first, second)
            .ok_or(GameError::NoPendingCard)?;
        match self.play_card(color, pending.index, action) {
            Ok(report) => Ok(Selection::Completed(report)),
            Err(err) => {
                pending.selection = None;
                self.phase = TurnPhase::CardActionPending(pending);
                Err(err)
            }
        }
    }

    /// Drop the pending card; it stays in hand
    pub fn cancel_card(&mut self, color: Color) -> Result<(), GameError> {
        self.require_turn(color)?;
        if self.pending_card().is_none() {
            return Err(GameError::NoPendingCard);
        }
        self.phase = TurnPhase::AwaitingMove { color };
        Ok(())
    }

    /// Play the card at `index` with a fully selected effect
    pub fn play_card(&mut self, color: Color, index: usize, action: CardAction) -> Result<TurnReport, GameError> {
        self.require_turn(color)?;
        if self.card_played {
            return Err(GameError::AlreadyPlayedCard);
        }
        let card = self.hands[color].playable(index)?;
        if card.kind != action.kind() {
            return Err(GameError::CardMismatch {
                index,
                kind: card.kind.name(),
            });
        }

        let outcome = apply_card(&self.position, self.shield, color, action)?;

        self.position = outcome.position;
        self.shield = outcome.shield;
        self.hands[color].remove(index);
        self.card_played = true;

        let result = if outcome.ends_turn {
            self.end_turn(color)
        } else {
            self.phase = TurnPhase::AwaitingMove { color };
            None
        };

        Ok(TurnReport {
            actor: color,
            action: LastAction::Card {
                kind: action.kind(),
                effect: action,
                captured: outcome.captured.is_some(),
            },
            drawn: None,
            turn_passed: outcome.ends_turn,
            outcome: result,
        })
    }

    // ========================================================================
    // TURN BOUNDARIES
    // ========================================================================

    /// `color` owns the turn, pending card or not
    fn require_turn(&self, color: Color) -> Result<(), GameError> {
        match self.phase {
            TurnPhase::WaitingForOpponent => Err(GameError::GameNotStarted),
            TurnPhase::GameOver { .. } => Err(GameError::GameOver),
            _ if self.turn() != Some(color) => Err(GameError::NotYourTurn),
            _ => Ok(()),
        }
    }

    /// `color` owns the turn and no card is mid-selection
    fn require_free_turn(&self, color: Color) -> Result<(), GameError> {
        self.require_turn(color)?;
        if self.pending_card().is_some() {
            return Err(GameError::CardSelectionPending);
        }
        Ok(())
    }

    fn check_first_selection(&self, kind: CardKind, color: Color, square: Square) -> Result<(), GameError> {
        let piece = self.position.piece_at(square);
        match kind {
            CardKind::Swap if piece.is_none() => Err(GameError::ColorMismatch),
            CardKind::Teleport | CardKind::KnightLeap if piece.map(|p| p.color) != Some(color) => {
                Err(GameError::NotOwnPiece(square))
            }
            _ => Ok(()),
        }
    }

    fn check_standard_capture(&self, mv: &Move) -> Result<(), GameError> {
        if !self.rules.shield_blocks_standard_captures || !mv.is_capture() {
            return Ok(());
        }
        let target = mv.captured_square().unwrap_or(mv.to);
        match self.shield {
            Some(shield) if shield.protects(target, mv.piece.color) => Err(GameError::ShieldBlocked(target)),
            _ => Ok(()),
        }
    }

    /// Add a card for `color` when the action qualified and the hand has room
    fn award(&mut self, color: Color, reasons: Vec<DrawReason>) -> Option<DrawnCard> {
        if reasons.is_empty() {
            return None;
        }
        if self.hands[color].is_full() {
            tracing::debug!(%color, ?reasons, "hand full, draw skipped");
            return None;
        }
        let card = self.deck.draw();
        self.hands[color].draw(card.clone());
        tracing::debug!(%color, card = %card.name, ?reasons, "card drawn");
        Some(DrawnCard { card, reasons })
    }

    /// The position already names the next mover; run the boundary and
    /// check whether they can move at all
    fn end_turn(&mut self, previous: Color) -> Option<GameOutcome> {
        let next = previous.opponent();
        debug_assert_eq!(self.position.side_to_move(), next);
        self.begin_turn(next);

        let outcome = self.check_outcome();
        if let Some(outcome) = outcome {
            self.phase = TurnPhase::GameOver { outcome };
        }
        outcome
    }

    fn begin_turn(&mut self, color: Color) {
        self.card_played = false;
        self.hands[color].clear_newly_drawn();
        if self.shield.map_or(false, |s| s.owner == color) {
            self.shield = None;
        }
        self.phase = TurnPhase::AwaitingMove { color };
    }

    fn check_outcome(&self) -> Option<GameOutcome> {
        match movegen::status(&self.position) {
            GameStatus::Ongoing => None,
            GameStatus::Checkmate { winner } => Some(GameOutcome::Checkmate { winner }),
            GameStatus::Stalemate => Some(GameOutcome::Stalemate),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
