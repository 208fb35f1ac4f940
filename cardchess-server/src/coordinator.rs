//! Session coordinator
//!
//! Pairs connections into sessions, routes each client action to its
//! session's `Game`, and fans the results out to both seats.
//!
//! Lock order is always `waiting` → `sessions` → a session's own mutex.
//! Every action holds its session's mutex from validation through
//! broadcast, so two actions on one session never interleave.

use crate::error::SessionError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::{ConnectionId, GameView, Seat, Session, SessionId};
use crate::store::SessionStore;
use cardchess_core::{Color, Deck, Game, GameError, RuleConfig, Selection, TurnReport};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Per-connection state handed to every handler
#[derive(Debug)]
pub struct ConnectionContext {
    id: ConnectionId,
    tx: UnboundedSender<ServerMessage>,
    seat: Option<(SessionId, Color)>,
}

impl ConnectionContext {
    pub fn new(tx: UnboundedSender<ServerMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
            seat: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Session and color this connection plays, once joined
    pub fn seat(&self) -> Option<(&str, Color)> {
        self.seat.as_ref().map(|(id, color)| (id.as_str(), *color))
    }

    pub fn send(&self, msg: ServerMessage) {
        let _ = self.tx.send(msg);
    }
}

pub struct Coordinator {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
    /// Session holding the single open matchmaking slot
    waiting: Mutex<Option<SessionId>>,
    store: Arc<dyn SessionStore>,
    rules: RuleConfig,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Coordinator {
    pub fn new(store: Arc<dyn SessionStore>, rules: RuleConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            waiting: Mutex::new(None),
            store,
            rules,
        }
    }

    pub fn rules(&self) -> RuleConfig {
        self.rules
    }

    pub fn live_sessions(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Id of the session currently waiting for a second player
    pub fn waiting_session(&self) -> Option<SessionId> {
        lock(&self.waiting).clone()
    }

    // ========================================================================
    // DISPATCH
    // ========================================================================

    /// Apply one client message. Errors go back to the sender only.
    pub fn handle(&self, ctx: &mut ConnectionContext, msg: ClientMessage) {
        if let Err(err) = self.dispatch(ctx, msg) {
            tracing::debug!(connection = %ctx.id, code = err.code(), "rejected: {err}");
            ctx.send(ServerMessage::error(err.code(), err.to_string()));
        }
    }

    fn dispatch(&self, ctx: &mut ConnectionContext, msg: ClientMessage) -> Result<(), SessionError> {
        match msg {
            ClientMessage::FindMatch => self.find_match(ctx).map(drop),
            ClientMessage::JoinGame { session_id } => self.join_game(ctx, &session_id).map(drop),
            ClientMessage::FetchState => self.with_seat(ctx, |session, color| {
                session.send(color, session.state_for(color));
                Ok(())
            }),
            ClientMessage::Move { from, to, promotion } => self.with_seat(ctx, |session, color| {
                let report = session.game_mut().play_move(color, from, to, promotion)?;
                announce(session, report);
                Ok(())
            }),
            ClientMessage::SubmitPosition { fen } => self.with_seat(ctx, |session, color| {
                let report = session.game_mut().submit_position(color, &fen)?;
                announce(session, report);
                Ok(())
            }),
            ClientMessage::SkipTurn => self.with_seat(ctx, |session, color| {
                let report = session.game_mut().skip_turn(color)?;
                announce(session, report);
                Ok(())
            }),
            ClientMessage::PlayCard { index } => self.with_seat(ctx, |session, color| {
                let pending = session.game_mut().activate_card(color, index)?;
                session.send(
                    color,
                    ServerMessage::CardPending {
                        index: pending.index,
                        kind: pending.kind,
                        selection: None,
                    },
                );
                Ok(())
            }),
            ClientMessage::SelectSquare { square } => self.with_seat(ctx, |session, color| {
                match session.game_mut().select_square(color, square)? {
                    Selection::Pending(pending) => session.send(
                        color,
                        ServerMessage::CardPending {
                            index: pending.index,
                            kind: pending.kind,
                            selection: pending.selection,
                        },
                    ),
                    Selection::Completed(report) => announce(session, report),
                }
                Ok(())
            }),
            ClientMessage::CancelCard => self.with_seat(ctx, |session, color| {
                session.game_mut().cancel_card(color)?;
                session.send(color, ServerMessage::CardCanceled);
                Ok(())
            }),
        }
    }

    /// Run `action` against the caller's session under its lock, then save
    fn with_seat<F>(&self, ctx: &ConnectionContext, action: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut Session, Color) -> Result<(), GameError>,
    {
        let (id, color) = ctx.seat().ok_or(SessionError::NotSeated)?;
        let session = self.session(id)?;
        let mut session = lock(&session);
        action(&mut session, color)?;
        self.persist(&session);
        Ok(())
    }

    // ========================================================================
    // MEMBERSHIP
    // ========================================================================

    /// Take the open slot if there is one, otherwise open a new session
    pub fn find_match(&self, ctx: &mut ConnectionContext) -> Result<SessionId, SessionError> {
        if let Some((id, _)) = ctx.seat() {
            return Err(SessionError::AlreadySeated(id.to_string()));
        }

        let mut waiting = lock(&self.waiting);
        let id = match waiting.as_ref().and_then(|id| self.live(id)) {
            Some(session) => lock(&session).id().to_string(),
            None => {
                let (id, _) = self.create_session();
                *waiting = Some(id.clone());
                id
            }
        };
        self.seat_player(ctx, &id, &mut waiting)?;
        Ok(id)
    }

    /// Join a specific session by id
    pub fn join_game(&self, ctx: &mut ConnectionContext, id: &str) -> Result<Color, SessionError> {
        if let Some((current, _)) = ctx.seat() {
            return Err(SessionError::AlreadySeated(current.to_string()));
        }
        let mut waiting = lock(&self.waiting);
        self.seat_player(ctx, id, &mut waiting)
    }

    /// Open-slot lookup for clients that join over the socket afterwards.
    /// Returns the session id and whether it was newly created.
    pub fn reserve_match(&self) -> (SessionId, bool) {
        let mut waiting = lock(&self.waiting);
        if let Some(id) = waiting.as_ref().filter(|id| self.live(id).is_some()) {
            return (id.clone(), false);
        }
        let (id, session) = self.create_session();
        self.persist(&lock(&session));
        *waiting = Some(id.clone());
        (id, true)
    }

    /// Seat `ctx` in session `id`. Caller holds the waiting-slot lock.
    fn seat_player(
        &self,
        ctx: &mut ConnectionContext,
        id: &str,
        waiting: &mut Option<SessionId>,
    ) -> Result<Color, SessionError> {
        let session = self.session(id)?;
        let mut session = lock(&session);
        let color = session.free_color().ok_or(SessionError::GameFull)?;

        session.seat(color, Seat::new(ctx.id, ctx.tx.clone()));
        ctx.seat = Some((id.to_string(), color));
        tracing::info!(session = %id, connection = %ctx.id, %color, "player joined");

        session.send(
            color,
            ServerMessage::ColorAssignment {
                color,
                message: format!("You are playing as {color}"),
            },
        );

        if session.free_color().is_none() {
            if waiting.as_deref() == Some(id) {
                *waiting = None;
            }
            if session.game().turn().is_none() && session.game().outcome().is_none() {
                let first = session.game_mut().start()?;
                tracing::info!(session = %id, "match started");
                session.broadcast(ServerMessage::MatchStart {
                    session_id: id.to_string(),
                    fen: session.game().position().to_record(),
                    current_turn: first,
                    message: "Both players connected. Game is starting!".to_string(),
                });
                session.send_hands();
            } else {
                session.send(color, session.state_for(color));
            }
        } else {
            if session.game().turn().is_none() && waiting.is_none() {
                *waiting = Some(id.to_string());
            }
            session.send(
                color,
                ServerMessage::Waiting {
                    session_id: id.to_string(),
                    message: "Waiting for an opponent to join...".to_string(),
                },
            );
        }

        self.persist(&session);
        Ok(color)
    }

    /// The connection closed: free its color and tell the other side
    pub fn disconnect(&self, ctx: &mut ConnectionContext) {
        let Some((id, color)) = ctx.seat.take() else {
            return;
        };
        let mut waiting = lock(&self.waiting);
        let Some(session) = self.live(&id) else {
            return;
        };

        let empty = {
            let mut session = lock(&session);
            session.vacate(ctx.id);
            tracing::info!(session = %id, connection = %ctx.id, %color, "player disconnected");
            session.broadcast(ServerMessage::OpponentDisconnected {
                message: format!("The {color} player disconnected"),
            });
            self.persist(&session);
            session.player_count() == 0
        };

        if empty {
            if waiting.as_deref() == Some(id.as_str()) {
                *waiting = None;
            }
            self.sessions
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
            tracing::debug!(session = %id, "session released");
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Public view of a session, live or stored
    pub fn view(&self, id: &str) -> Result<GameView, SessionError> {
        if let Some(session) = self.live(id) {
            return Ok(GameView::from(&lock(&session).record()));
        }
        match self.store.load(id)? {
            Some(record) => Ok(GameView::from(&record)),
            None => Err(SessionError::SessionNotFound(id.to_string())),
        }
    }

    fn live(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn session(&self, id: &str) -> Result<Arc<Mutex<Session>>, SessionError> {
        self.live(id)
            .ok_or_else(|| SessionError::SessionNotFound(id.to_string()))
    }

    fn create_session(&self) -> (SessionId, Arc<Mutex<Session>>) {
        let id = Uuid::new_v4().to_string();
        let game = Game::new(self.rules, Deck::new());
        let session = Arc::new(Mutex::new(Session::new(id.clone(), game)));
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), Arc::clone(&session));
        tracing::info!(session = %id, "session created");
        (id, session)
    }

    fn persist(&self, session: &Session) {
        if let Err(err) = self.store.save(&session.record()) {
            tracing::warn!(session = %session.id(), "failed to save session: {err}");
        }
    }
}

/// Broadcast a committed action to both seats
fn announce(session: &Session, report: TurnReport) {
    let game = session.game();
    tracing::info!(
        session = %session.id(),
        actor = %report.actor,
        action = ?report.action,
        "action accepted"
    );

    session.broadcast(ServerMessage::UpdateBoard {
        fen: game.position().to_record(),
        current_turn: game.turn(),
        shield: game.shield(),
        last_action: report.action,
    });

    if let Some(drawn) = report.drawn {
        session.send(
            report.actor,
            ServerMessage::CardDrawn {
                card: drawn.card,
                reasons: drawn.reasons,
            },
        );
    }
    session.send_hands();

    if let Some(outcome) = report.outcome {
        tracing::info!(session = %session.id(), ?outcome, "game over");
        session.broadcast(ServerMessage::GameOver { outcome });
    }
}
