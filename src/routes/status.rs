//! # routes::status
//!
//! The Status Surface: read-only snapshots of the session singleton plus the
//! manual start/stop controls.
//!
//! | Method | Path      | Description                       |
//! |--------|-----------|-----------------------------------|
//! | GET    | `/`       | service descriptor                |
//! | GET    | `/health` | liveness probe                    |
//! | GET    | `/status` | SessionState JSON                 |
//! | GET    | `/price`  | latest tick (404 before first)    |
//! | POST   | `/start`  | start the session                 |
//! | POST   | `/stop`   | stop the session + summary        |

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::engine::session;
use crate::error::AppError;
use crate::state::SharedState;

// ─── GET / ────────────────────────────────────────────────────────────────────

pub async fn index(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "status":  "online",
        "service": "daybreak trading bot",
        "version": env!("CARGO_PKG_VERSION"),
        "symbol":  state.config.symbol,
        "mode":    state.config.execution_mode.to_string(),
    }))
}

// ─── GET /health ──────────────────────────────────────────────────────────────

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status":    "healthy",
        "timestamp": chrono::Utc::now(),
    }))
}

// ─── GET /status ──────────────────────────────────────────────────────────────

pub async fn get_status(State(state): State<SharedState>) -> impl IntoResponse {
    let session = state.session.read().await;
    Json(json!({
        "ok":      true,
        "session": *session,
    }))
}

// ─── GET /price ───────────────────────────────────────────────────────────────

pub async fn get_price(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let tick = state.last_tick.read().await;
    match &*tick {
        Some(tick) => Ok(Json(json!({
            "ok":   true,
            "tick": tick,
            "mid":  tick.mid(),
        }))),
        None => Err(AppError::NotFound("no tick received yet".into())),
    }
}

// ─── POST /start ──────────────────────────────────────────────────────────────

pub async fn start_bot(State(state): State<SharedState>) -> impl IntoResponse {
    match session::start(&state).await {
        Ok(()) => Json(json!({
            "success": true,
            "message": "Trading session started",
        })),
        Err(reason) => Json(json!({
            "success": false,
            "message": reason,
        })),
    }
}

// ─── POST /stop ───────────────────────────────────────────────────────────────

pub async fn stop_bot(State(state): State<SharedState>) -> impl IntoResponse {
    match session::stop(&state).await {
        Ok(summary) => Json(json!({
            "success": true,
            "message": format!(
                "Trading session stopped — {} trades, net ${:.2}, capital ${:.2}",
                summary.trades_today, summary.net_pnl, summary.capital
            ),
            "summary": summary,
        })),
        Err(reason) => Json(json!({
            "success": false,
            "message": reason,
        })),
    }
}
