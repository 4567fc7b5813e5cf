//! Fake search backend for fetcher tests
//!
//! Serves canned REST responses and scripted similarity streams on an
//! ephemeral local port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use kensaku_core::{EventSink, SessionEvent};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use url::Url;

/// Start the backend and return its base URL
pub async fn spawn_backend() -> Url {
    let app = Router::new()
        .route("/api/search", get(search))
        .route("/api/similar", get(similar))
        .route("/api/actress_top_videos", get(top_videos))
        .route("/ws/similar", get(similar_ws))
        .route("/ws/locked", get(|| async { StatusCode::UNAUTHORIZED }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

/// WebSocket URL for a path on the backend
pub fn ws_url(base: &Url, path: &str) -> Url {
    let mut url = base.join(path).unwrap();
    url.set_scheme("ws").unwrap();
    url
}

/// Event channel for a fetcher run
pub fn channel() -> (EventSink, mpsc::UnboundedReceiver<SessionEvent>) {
    mpsc::unbounded_channel()
}

/// Drain everything left in a closed channel
pub async fn collect(mut rx: mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

/// Event type names, for order assertions
pub fn kinds(events: &[SessionEvent]) -> Vec<&'static str> {
    events.iter().map(|event| event.kind.as_str()).collect()
}

fn video(id: &str, score: f64, actresses: &str) -> Value {
    json!({
        "dvdid": id,
        "title": format!("Title {id}"),
        "jptitle": format!("タイトル {id}"),
        "releasedate": "2023-05-12",
        "image": format!("https://img.example/{id}.jpg"),
        "actress_names": actresses,
        "sem_score": score
    })
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("q").map(String::as_str) {
        Some("broken") => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"detail": "Index warming up"})),
        )
            .into_response(),
        Some("nothing") => Json(json!({"mode": "Hybrid", "results": []})).into_response(),
        Some(_) => {
            let top_k: usize = params
                .get("top_k")
                .and_then(|k| k.parse().ok())
                .unwrap_or(20);
            let results: Vec<Value> = vec![
                json!({
                    "data": {"type": "bio", "name": "Aoi", "jpName": "葵", "tier": 2, "height": 160},
                    "sem_score": 1.0,
                    "is_bio": true
                }),
                json!({"data": video("ABC-123", 0.91, "Aoi, Mei"), "sem_score": 0.91}),
                json!({"data": video("ABC-124", 0.82, "Aoi"), "sem_score": 0.82}),
            ]
            .into_iter()
            .take(top_k)
            .collect();
            Json(json!({"mode": "Hybrid", "results": results})).into_response()
        }
        None => (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"detail": [{"msg": "field required"}]})))
            .into_response(),
    }
}

async fn similar(Query(params): Query<HashMap<String, String>>) -> Response {
    let id = params.get("dvd_id").cloned().unwrap_or_default();
    Json(json!({
        "mode": "Similarity",
        "source": {"dvdid": id, "title": "Anchor", "image": "N/A"},
        "results": [{"data": video("SIM-1", 0.77, "Rin"), "sem_score": 0.77}]
    }))
    .into_response()
}

async fn top_videos(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("name").map(String::as_str) {
        Some("Aoi") => Json(json!({
            "profile": {"name": "Aoi", "jpName": "葵", "avatar": "https://img.example/aoi.jpg"},
            "videos": [video("TOP-1", 0.0, "Aoi"), video("TOP-2", 0.0, "Aoi")]
        }))
        .into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"detail": "Actress not found"}))).into_response(),
    }
}

async fn similar_ws(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(run_stream)
}

async fn send(socket: &mut WebSocket, value: Value) {
    // The client may already have hung up
    let _ = socket.send(Message::Text(value.to_string())).await;
}

async fn run_stream(mut socket: WebSocket) {
    let Some(Ok(Message::Text(config))) = socket.recv().await else {
        return;
    };
    let config: Value = serde_json::from_str(&config).unwrap();
    let id = config["dvd_id"].as_str().unwrap_or_default().to_string();
    let top_k = config["top_k"].as_u64().unwrap_or(20) as usize;

    let source = json!({"type": "source", "data": {"dvdid": id, "title": "Anchor", "image": ""}});
    match id.as_str() {
        "ABC-123" => {
            send(&mut socket, source).await;
            let matches = [("M-1", 0.93), ("M-2", 0.88), ("M-3", 0.71)];
            let sent = matches.len().min(top_k);
            for (mid, score) in matches.iter().take(sent) {
                send(&mut socket, json!({"type": "match", "data": video(mid, *score, "Aoi")})).await;
            }
            send(&mut socket, json!({"type": "done", "count": sent})).await;
        }
        "NONE-1" => {
            send(&mut socket, source).await;
            send(&mut socket, json!({"type": "done", "count": 0})).await;
        }
        "ERR-1" => {
            send(&mut socket, json!({"type": "error", "message": "Movie not found"})).await;
        }
        "DROP-1" => {
            send(&mut socket, source).await;
            send(&mut socket, json!({"type": "match", "data": video("M-1", 0.9, "Aoi")})).await;
            let _ = socket.send(Message::Close(None)).await;
        }
        "SLOW-1" => {
            send(&mut socket, source).await;
            send(&mut socket, json!({"type": "match", "data": video("M-1", 0.9, "Aoi")})).await;
            tokio::time::sleep(Duration::from_secs(30)).await;
            send(&mut socket, json!({"type": "done", "count": 1})).await;
        }
        _ => {
            send(&mut socket, json!({"type": "error", "message": "Unknown identifier"})).await;
        }
    }
}
