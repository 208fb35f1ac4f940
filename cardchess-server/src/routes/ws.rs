//! WebSocket endpoint
//!
//! Each socket gets a `ConnectionContext`. Outbound messages go through an
//! unbounded channel drained by a writer task, so the coordinator never
//! awaits while holding a session lock.

use crate::coordinator::ConnectionContext;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::ServerState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<ServerState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut ctx = ConnectionContext::new(tx);
    tracing::debug!(connection = %ctx.id(), "socket opened");

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!("failed to encode message: {err}");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(msg) => state.coordinator.handle(&mut ctx, msg),
            Err(e) => ctx.send(ServerMessage::error(
                "invalid_message",
                format!("Invalid message: {}", e),
            )),
        }
    }

    state.coordinator.disconnect(&mut ctx);
    tracing::debug!(connection = %ctx.id(), "socket closed");
    writer.abort();
}
