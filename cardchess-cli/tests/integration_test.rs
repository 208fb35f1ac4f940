//! Integration tests for CardChess
//!
//! Tests the full stack: position records, move generation, card effects,
//! the turn machine and the session coordinator.

use cardchess_core::{
    movegen, CardAction, CardKind, Color, Deck, Game, GameError, Position, RuleConfig, Square,
    TurnPhase, HAND_LIMIT, STARTING_RECORD,
};
use cardchess_server::{ClientMessage, ConnectionContext, Coordinator, MemoryStore, ServerMessage};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tokio::sync::mpsc;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

fn new_game(seed: u64) -> Game {
    let mut game = Game::new(RuleConfig::default(), Deck::seeded(seed));
    game.start().unwrap();
    game
}

/// Squares holding `color`'s pieces
fn own_squares(position: &Position, color: Color) -> Vec<Square> {
    position
        .pieces()
        .filter(|(_, p)| p.color == color)
        .map(|(sq, _)| sq)
        .collect()
}

/// A random, often illegal, effect for `kind`
fn random_action(rng: &mut ChaCha8Rng, position: &Position, color: Color, kind: CardKind) -> CardAction {
    let own = own_squares(position, color);
    let any_square = |rng: &mut ChaCha8Rng| Square::from_index(rng.gen_range(0..64)).unwrap();
    let from = *own.choose(rng).unwrap();

    match kind {
        CardKind::Teleport => CardAction::Teleport {
            from,
            to: any_square(rng),
        },
        CardKind::Shield => CardAction::Shield { square: from },
        CardKind::KnightLeap => {
            let (df, dr) = *[(1, 2), (2, 1), (-1, 2), (-2, 1), (1, -2), (2, -1), (-1, -2), (-2, -1)]
                .choose(rng)
                .unwrap();
            CardAction::KnightLeap {
                from,
                to: from.offset(df, dr).unwrap_or(from),
            }
        }
        CardKind::Swap => CardAction::Swap {
            first: any_square(rng),
            second: any_square(rng),
        },
    }
}

/// Invariants that hold between any two actions
fn assert_consistent(game: &Game) {
    let record = game.position().to_record();
    let reparsed = Position::parse(&record).expect("committed positions stay valid");
    assert_eq!(reparsed.to_record(), record);

    for color in Color::ALL {
        assert!(game.hand(color).len() <= HAND_LIMIT);
    }

    if let Some(turn) = game.turn() {
        assert_eq!(turn, game.position().side_to_move());
        if let Some(shield) = game.shield() {
            assert!(shield.owner != turn || game.card_played_this_turn());
        }
    }
}

// ============================================================================
// GAME LOGIC TESTS
// ============================================================================

#[test]
fn test_opening_then_capture() {
    let mut game = new_game(11);

    let report = game.play_move(Color::White, sq("e2"), sq("e4"), None).unwrap();
    assert!(report.drawn.is_none());
    assert_eq!(game.turn(), Some(Color::Black));

    game.play_move(Color::Black, sq("d7"), sq("d5"), None).unwrap();
    let report = game.play_move(Color::White, sq("e4"), sq("d5"), None).unwrap();
    assert!(report.drawn.is_some());
    assert_eq!(game.hand(Color::White).len(), 1);
    assert!(game.hand(Color::White).cards()[0].newly_drawn);
}

#[test]
fn test_random_games_keep_invariants() {
    for seed in 0..12u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut game = new_game(seed);

        for _ply in 0..120 {
            let Some(color) = game.turn() else {
                break;
            };
            let before = game.position().to_record();
            let hand_before = game.hand(color).clone();

            // Try a card now and then; failures must change nothing
            let playable: Vec<usize> = (0..game.hand(color).len())
                .filter(|&i| game.hand(color).playable(i).is_ok())
                .collect();
            if !playable.is_empty() && !game.card_played_this_turn() && rng.gen_bool(0.4) {
                let index = *playable.choose(&mut rng).unwrap();
                let kind = game.hand(color).cards()[index].card.kind;
                let action = random_action(&mut rng, game.position(), color, kind);
                match game.play_card(color, index, action) {
                    Ok(report) => {
                        assert!(report.drawn.is_none());
                        assert_eq!(game.hand(color).len(), hand_before.len() - 1);
                    }
                    Err(_) => {
                        assert_eq!(game.position().to_record(), before);
                        assert_eq!(game.hand(color), &hand_before);
                    }
                }
                assert_consistent(&game);
                continue;
            }

            let moves = movegen::legal_moves(game.position());
            if moves.is_empty() || rng.gen_bool(0.05) {
                match game.skip_turn(color) {
                    Ok(_) => {}
                    Err(GameError::SelfCheck) | Err(GameError::AlreadyPlayedCard) => {
                        assert_eq!(game.position().to_record(), before);
                        let mv = *moves.choose(&mut rng).expect("side in check has moves while ongoing");
                        game.play_move(color, mv.from, mv.to, mv.promotion).unwrap();
                    }
                    Err(err) => panic!("unexpected skip rejection: {err}"),
                }
            } else {
                let mv = *moves.choose(&mut rng).unwrap();
                game.play_move(color, mv.from, mv.to, mv.promotion).unwrap();
            }
            assert_consistent(&game);
        }

        if let TurnPhase::GameOver { outcome } = game.phase() {
            assert!(movegen::legal_moves(game.position()).is_empty(), "{outcome:?}");
        }
    }
}

#[test]
fn test_card_effects_never_grant_draws() {
    let mut game = Game::from_position(
        Position::parse("4k3/8/8/3p4/8/4N3/8/4K3 w - - 0 1").unwrap(),
        RuleConfig::default(),
        Deck::seeded(2),
    );
    game.start().unwrap();

    // White earns a card by skipping, then uses it on the next turn
    game.skip_turn(Color::White).unwrap();
    game.play_move(Color::Black, sq("e8"), sq("f8"), None).unwrap();
    let kind = game.hand(Color::White).cards()[0].card.kind;

    // Knight's Leap even captures, and still draws nothing
    let action = match kind {
        CardKind::KnightLeap => CardAction::KnightLeap { from: sq("e3"), to: sq("d5") },
        CardKind::Teleport => CardAction::Teleport { from: sq("e3"), to: sq("e6") },
        CardKind::Swap => CardAction::Swap { first: sq("e3"), second: sq("e1") },
        CardKind::Shield => CardAction::Shield { square: sq("e3") },
    };
    let report = game.play_card(Color::White, 0, action).unwrap();
    assert!(report.drawn.is_none());
    assert!(game.hand(Color::White).is_empty());
}

// ============================================================================
// SESSION TESTS
// ============================================================================

#[test]
fn test_two_clients_play_through_coordinator() {
    let coord = Coordinator::new(Arc::new(MemoryStore::new()), RuleConfig::default());
    let (tx_w, mut rx_w) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    let mut white = ConnectionContext::new(tx_w);
    let mut black = ConnectionContext::new(tx_b);

    coord.handle(&mut white, ClientMessage::FindMatch);
    coord.handle(&mut black, ClientMessage::FindMatch);

    let moves = [("e2", "e4"), ("e7", "e5"), ("g1", "f3"), ("b8", "c6")];
    for (i, (from, to)) in moves.iter().enumerate() {
        let ctx = if i % 2 == 0 { &mut white } else { &mut black };
        coord.handle(
            ctx,
            ClientMessage::Move {
                from: sq(from),
                to: sq(to),
                promotion: None,
            },
        );
    }

    let mut last_fen = None;
    while let Ok(msg) = rx_b.try_recv() {
        assert!(!matches!(msg, ServerMessage::Error { .. }), "{msg:?}");
        if let ServerMessage::UpdateBoard { fen, .. } = msg {
            last_fen = Some(fen);
        }
    }
    while let Ok(msg) = rx_w.try_recv() {
        assert!(!matches!(msg, ServerMessage::Error { .. }), "{msg:?}");
    }

    let fen = last_fen.expect("black saw the board updates");
    assert_ne!(fen, STARTING_RECORD);
    assert_eq!(
        fen,
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3"
    );
}
