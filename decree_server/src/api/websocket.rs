//! WebSocket handler for real-time room/game communication.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws` — no prior authentication, a guest
//!    identity is minted on accept.
//! 2. The hub assigns a stable [`PlayerId`] and hands back the outbound
//!    event channel it will drain for the lifetime of the connection.
//! 3. Two tasks run concurrently: a send task relaying [`ServerEvent`]s onto
//!    the socket, and a receive loop deserializing [`ClientMessage`]s and
//!    routing them through the hub.
//! 4. On disconnect, the hub tears down the connection's room membership.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use decree_engine::{ClientMessage, PlayerId};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};

use super::AppState;

/// Upgrade an HTTP connection to a WebSocket for room/game communication.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one established WebSocket connection until it closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let (transport, mut events) = tokio::sync::mpsc::unbounded_channel();
    let player_id: PlayerId = state.hub.accept_connection(transport).await;
    info!(player_id = %player_id, "websocket connected");

    let send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(e) => {
                    warn!(player_id = %player_id, error = %e, "failed to serialize server event");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => state.hub.dispatch(player_id, client_msg).await,
                Err(e) => warn!(player_id = %player_id, error = %e, "failed to parse client message"),
            },
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "websocket closed by client");
                break;
            }
            Err(e) => {
                warn!(player_id = %player_id, error = %e, "websocket error");
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    state.hub.remove_connection(player_id).await;
    info!(player_id = %player_id, "websocket disconnected");
}
