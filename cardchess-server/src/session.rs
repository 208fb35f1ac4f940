//! A single match: the game plus the two connection slots

use crate::protocol::ServerMessage;
use crate::store::SessionRecord;
use cardchess_core::{ByColor, Color, Game, Shield, TurnPhase};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

pub type SessionId = String;
pub type ConnectionId = Uuid;

/// A connection holding one color
#[derive(Clone, Debug)]
pub struct Seat {
    pub connection: ConnectionId,
    tx: UnboundedSender<ServerMessage>,
}

impl Seat {
    pub fn new(connection: ConnectionId, tx: UnboundedSender<ServerMessage>) -> Self {
        Self { connection, tx }
    }

    /// Queue a message; a closed connection just drops it
    pub fn send(&self, msg: ServerMessage) {
        let _ = self.tx.send(msg);
    }
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    game: Game,
    seats: ByColor<Option<Seat>>,
}

impl Session {
    pub fn new(id: SessionId, game: Game) -> Self {
        Self {
            id,
            game,
            seats: ByColor::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn player_count(&self) -> usize {
        Color::ALL.iter().filter(|&&c| self.seats[c].is_some()).count()
    }

    /// First open color, white before black
    pub fn free_color(&self) -> Option<Color> {
        Color::ALL.into_iter().find(|&c| self.seats[c].is_none())
    }

    pub fn seat(&mut self, color: Color, seat: Seat) {
        self.seats[color] = Some(seat);
    }

    /// Release whichever color `connection` holds
    pub fn vacate(&mut self, connection: ConnectionId) -> Option<Color> {
        let color = Color::ALL
            .into_iter()
            .find(|&c| self.seats[c].as_ref().map(|s| s.connection) == Some(connection))?;
        self.seats[color] = None;
        Some(color)
    }

    pub fn send(&self, color: Color, msg: ServerMessage) {
        if let Some(seat) = &self.seats[color] {
            seat.send(msg);
        }
    }

    pub fn broadcast(&self, msg: ServerMessage) {
        for color in Color::ALL {
            self.send(color, msg.clone());
        }
    }

    /// Each seated player gets their own hand
    pub fn send_hands(&self) {
        for color in Color::ALL {
            self.send(
                color,
                ServerMessage::Hand {
                    cards: self.game.hand(color).clone(),
                },
            );
        }
    }

    /// Full state as seen by `color`
    pub fn state_for(&self, color: Color) -> ServerMessage {
        ServerMessage::State {
            session_id: self.id.clone(),
            color,
            fen: self.game.position().to_record(),
            current_turn: self.game.turn(),
            phase: self.game.phase(),
            shield: self.game.shield(),
            hand: self.game.hand(color).clone(),
            opponent_cards: self.game.hand(color.opponent()).len(),
            players: self.player_count(),
        }
    }

    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            id: self.id.clone(),
            fen: self.game.position().to_record(),
            hands: ByColor::new(
                self.game.hand(Color::White).clone(),
                self.game.hand(Color::Black).clone(),
            ),
            turn: self.game.turn(),
            phase: self.game.phase(),
            shield: self.game.shield(),
            card_played: self.game.card_played_this_turn(),
            seats: ByColor::new(self.seats.white.is_some(), self.seats.black.is_some()),
        }
    }
}

/// What anyone may see of a session: no hand contents
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameView {
    pub session_id: SessionId,
    pub fen: String,
    pub turn: Option<Color>,
    pub phase: TurnPhase,
    pub shield: Option<Shield>,
    pub hand_sizes: ByColor<usize>,
    pub players: usize,
}

impl From<&SessionRecord> for GameView {
    fn from(record: &SessionRecord) -> Self {
        Self {
            session_id: record.id.clone(),
            fen: record.fen.clone(),
            turn: record.turn,
            phase: record.phase,
            shield: record.shield,
            hand_sizes: ByColor::new(record.hands.white.len(), record.hands.black.len()),
            players: record.players(),
        }
    }
}
