//! # routes::monitor
//!
//! WebSocket event stream for dashboards: a snapshot on connect, then every
//! [`BotEvent`](crate::events::BotEvent) the system broadcasts, as JSON text
//! frames. Slow clients skip events rather than stall the system.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::atomic::Ordering;
use tracing::{debug, info};

use crate::state::SharedState;

// ─── WebSocket Handler ────────────────────────────────────────────────────────

pub async fn ws_monitor(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let mut rx = state.broadcast_tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    info!("🔌 Monitor client connected");

    // ── Immediate snapshot so the client doesn't wait for the next event ─────
    let snapshot = {
        let session = state.session.read().await.clone();
        let last_tick = state.last_tick.read().await.clone();
        let cycles = state.cycle_count.load(Ordering::Relaxed);

        json!({
            "event":       "SNAPSHOT",
            "session":     session,
            "last_tick":   last_tick,
            "cycle_count": cycles,
        })
        .to_string()
    };

    if sender.send(Message::Text(snapshot.into())).await.is_err() {
        return; // Client closed before the snapshot went out
    }

    // ── Event Loop ────────────────────────────────────────────────────────────
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(json_str) => {
                        if sender.send(Message::Text(json_str.into())).await.is_err() {
                            break; // Client disconnect
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!("Monitor client lagged, skipped {n} events");
                    }
                    Err(_) => break, // Channel closed
                }
            }

            result = receiver.next() => {
                match result {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    _ => {} // Text/Binary from client — ignored
                }
            }
        }
    }

    info!("🔌 Monitor client disconnected");
}
