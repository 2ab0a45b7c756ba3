//! WebSocket integration tests: connect, create a room, and exchange messages
//! against a real bound listener (axum's `WebSocketUpgrade` can't be driven
//! through `tower::ServiceExt::oneshot`, so these spin up a TCP socket).

use decree_engine::{Hub, autoplay::Conservative};
use decree_server::api::{AppState, create_router};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::Arc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

type Ws = WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn spawn_server() -> String {
    let hub = Arc::new(Hub::new(Arc::new(Conservative)));
    let app = create_router(AppState { hub });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("ws://{addr}/ws")
}

async fn recv_json(ws: &mut Ws) -> serde_json::Value {
    let msg = ws.next().await.unwrap().unwrap();
    serde_json::from_str(&msg.into_text().unwrap()).unwrap()
}

/// Sends `create_room` and drains events until `room_created` arrives
/// (joining a room also emits a `room_joined`/`player_joined` pair first).
async fn create_room(ws: &mut Ws, player_name: &str) -> serde_json::Value {
    ws.send(Message::Text(
        json!({
            "type": "create_room",
            "playerName": player_name,
            "gameMode": "classic",
            "maxPlayers": 4,
        })
        .to_string()
        .into(),
    ))
    .await
    .unwrap();

    loop {
        let event = recv_json(ws).await;
        if event["type"] == "room_created" {
            return event;
        }
    }
}

#[tokio::test]
async fn create_room_round_trip() {
    let url = spawn_server().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

    let event = create_room(&mut ws, "Alice").await;

    assert_eq!(event["type"], "room_created");
    assert_eq!(event["playerName"], "Alice");
    assert_eq!(event["maxPlayers"], 4);
}

#[tokio::test]
async fn ping_gets_pong() {
    let url = spawn_server().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

    // A ping before joining a room is a no-op, not an error or a hang.
    ws.send(Message::Text(json!({"type": "ping"}).to_string().into()))
        .await
        .unwrap();

    create_room(&mut ws, "Bob").await;

    ws.send(Message::Text(json!({"type": "ping"}).to_string().into()))
        .await
        .unwrap();
    let event = recv_json(&mut ws).await;
    assert_eq!(event["type"], "pong");
}

#[tokio::test]
async fn malformed_message_does_not_close_connection() {
    let url = spawn_server().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

    ws.send(Message::Text("{ not json".into())).await.unwrap();

    let event = create_room(&mut ws, "Carol").await;
    assert_eq!(event["type"], "room_created");
}
