//! Integration tests for the HTTP side of the server: health, stats, and CORS.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use decree_engine::{Hub, autoplay::Conservative};
use decree_server::api::{AppState, create_router};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> axum::Router {
    let hub = Arc::new(Hub::new(Arc::new(Conservative)));
    create_router(AppState { hub })
}

#[tokio::test]
async fn health_check_reports_zero_connections_and_rooms_when_idle() {
    let app = test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["connections"], 0);
    assert_eq!(json["rooms"], 0);
}

#[tokio::test]
async fn stats_endpoint_reflects_created_rooms() {
    let hub = Arc::new(Hub::new(Arc::new(Conservative)));
    let app = create_router(AppState { hub: hub.clone() });

    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let player_id = hub.accept_connection(tx).await;
    hub.dispatch(
        player_id,
        decree_engine::ClientMessage::CreateRoom {
            player_name: "Alice".to_string(),
            game_mode: "classic".to_string(),
            max_players: 4,
        },
    )
    .await;

    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["rooms"], 1);
    assert_eq!(json["players"], 1);
    let room_details = json["roomDetails"].as_array().unwrap();
    assert_eq!(room_details.len(), 1);
    assert_eq!(room_details[0]["playerCount"], 1);
    assert!(room_details[0].get("id").is_some());
}

#[tokio::test]
async fn unknown_route_returns_not_found() {
    let app = test_app();

    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn request_id_header_is_present_on_responses() {
    let app = test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().get("x-request-id").is_some());
}
