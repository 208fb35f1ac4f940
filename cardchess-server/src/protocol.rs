//! WebSocket message types
//!
//! Both directions are JSON objects tagged by `"type"`.

use cardchess_core::{
    Card, CardKind, Color, DrawReason, GameOutcome, Hand, LastAction, PieceKind, Shield, Square,
    TurnPhase,
};
use serde::{Deserialize, Serialize};

/// Client → Server messages
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    FindMatch,
    JoinGame {
        session_id: String,
    },
    FetchState,
    Move {
        from: Square,
        to: Square,
        #[serde(default)]
        promotion: Option<PieceKind>,
    },
    SubmitPosition {
        fen: String,
    },
    SkipTurn,
    PlayCard {
        index: usize,
    },
    SelectSquare {
        square: Square,
    },
    CancelCard,
}

/// Server → Client messages
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ColorAssignment {
        color: Color,
        message: String,
    },
    Waiting {
        session_id: String,
        message: String,
    },
    MatchStart {
        session_id: String,
        fen: String,
        current_turn: Color,
        message: String,
    },
    UpdateBoard {
        fen: String,
        current_turn: Option<Color>,
        shield: Option<Shield>,
        last_action: LastAction,
    },
    /// The receiving player's own hand
    Hand {
        cards: Hand,
    },
    CardDrawn {
        card: Card,
        reasons: Vec<DrawReason>,
    },
    CardPending {
        index: usize,
        kind: CardKind,
        selection: Option<Square>,
    },
    CardCanceled,
    State {
        session_id: String,
        color: Color,
        fen: String,
        current_turn: Option<Color>,
        phase: TurnPhase,
        shield: Option<Shield>,
        hand: Hand,
        opponent_cards: usize,
        players: usize,
    },
    GameOver {
        #[serde(flatten)]
        outcome: GameOutcome,
    },
    OpponentDisconnected {
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_move() {
        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "move", "from": "e7", "to": "e8", "promotion": "knight"}))
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Move {
                from: "e7".parse().unwrap(),
                to: "e8".parse().unwrap(),
                promotion: Some(PieceKind::Knight),
            }
        );

        let msg: ClientMessage = serde_json::from_value(json!({"type": "move", "from": "e2", "to": "e4"})).unwrap();
        assert!(matches!(msg, ClientMessage::Move { promotion: None, .. }));
    }

    #[test]
    fn test_parse_unit_messages() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"skip_turn"}"#).unwrap();
        assert_eq!(msg, ClientMessage::SkipTurn);
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"play_card","index":2}"#).unwrap();
        assert_eq!(msg, ClientMessage::PlayCard { index: 2 });
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"select_square","square":"z9"}"#).is_err());
    }

    #[test]
    fn test_game_over_flattens_outcome() {
        let msg = ServerMessage::GameOver {
            outcome: GameOutcome::Checkmate { winner: Color::Black },
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"type": "game_over", "reason": "checkmate", "winner": "black"}));
    }

    #[test]
    fn test_error_message() {
        let value = serde_json::to_value(ServerMessage::error("not_your_turn", "it is not your turn")).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["code"], "not_your_turn");
    }
}
