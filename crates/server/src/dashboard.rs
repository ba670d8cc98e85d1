//! Read-only web view of the layout. Nothing here changes plate state.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use shared::protocol::StateEnvelope;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::app_state::AppState;

const DASHBOARD_PAGE: &str = include_str!("../templates/dashboard.html");

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/api/state", get(api_state))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(DASHBOARD_PAGE)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn api_state(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    Json(state.envelope())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let mut snapshots = state.snapshots.subscribe();
    let initial = state.envelope();

    let send_task = tokio::spawn(async move {
        let mut pending = Some(initial);
        loop {
            let envelope = match pending.take() {
                Some(envelope) => envelope,
                None => match snapshots.recv().await {
                    Ok(envelope) => envelope,
                    // Only the newest state matters to a viewer.
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "dashboard socket lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };
            let text = match serde_json::to_string(&envelope) {
                Ok(text) => text,
                Err(error) => {
                    warn!(%error, "failed to encode state envelope");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
