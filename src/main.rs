//! # Daybreak — Session-Gated Forex Trading Bot
//!
//! ```text
//!  ┌──────────────┐  every CYCLE_SECS   ┌──────────────────────────────┐
//!  │   Session    │ ──────────────────▶ │ MarketFeed → Indicators →    │
//!  │  Controller  │  window + limits    │ Detector → Executor          │
//!  └──────────────┘                     └──────────────┬───────────────┘
//!         │  writes                                    │ mutates, then notifies
//!         ▼                                            ▼
//!  ┌──────────────┐    reads     ┌─────────────┐   ┌──────────────┐
//!  │ SessionState │ ◀──────────── │ HTTP routes │   │   Telegram   │
//!  │  (singleton) │               │ + /webhook  │   │ notify + cmd │
//!  └──────────────┘               │ + /ws       │   └──────────────┘
//!                                 └─────────────┘
//! ```
//!
//! ## Environment Variables
//!
//! | Variable            | Default        | Description                     |
//! |---------------------|----------------|---------------------------------|
//! | `BIND_ADDR`         | `0.0.0.0:5000` | Address Axum listens on         |
//! | `SYMBOL`            | `EURUSD`       | Instrument                      |
//! | `EXECUTION_MODE`    | `demo`         | `demo` or `live`                |
//! | `FEED_URL`          | —              | Market feed; unset → synthetic  |
//! | `BRIDGE_URL`        | —              | Broker bridge (live mode)       |
//! | `TELEGRAM_TOKEN`    | —              | Notifier + command bot          |
//! | `RUST_LOG`          | `daybreak=info`| Tracing filter                  |

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use chrono::Utc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod engine;
mod error;
mod events;
mod market;
mod models;
mod notifier;
mod routes;
mod state;
mod telegram;

use config::Config;
use engine::session::{self, SessionController};
use routes::{
    monitor::ws_monitor,
    status::{get_price, get_status, health, index, start_bot, stop_bot},
    webhook::handle_webhook,
};
use state::build_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env ──────────────────────────────────────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("daybreak=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════════════════╗
  ║            DAYBREAK — Session Trading Bot             ║
  ║   Feed · Indicators · Signals · Risk · Telegram       ║
  ╚═══════════════════════════════════════════════════════╝"#);

    // ── 3. Config + shared state ──────────────────────────────────────────────
    let config = Config::from_env()?;
    info!(
        symbol = %config.symbol,
        mode = %config.execution_mode,
        window = ?config.window,
        "Configuration loaded"
    );
    let state = build_state(config);

    // ── 4. Background loops ───────────────────────────────────────────────────
    let _session_loop = SessionController::spawn(state.clone());
    if !state.notifier.is_enabled() {
        info!("Telegram notifications disabled (no credentials)");
    }
    if telegram::spawn(state.clone()).is_none() {
        info!("Telegram command bot disabled (no credentials)");
    }

    // ── 5. Auto-start when boot lands inside the trading window ───────────────
    if state.config.window.contains(Utc::now()) {
        info!("⏰ Inside trading window at boot — starting session");
        let _ = session::start(&state).await;
    }

    // ── 6. CORS ───────────────────────────────────────────────────────────────
    let addr: SocketAddr = state.config.bind_addr.parse()?;
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // ── 7. Router ─────────────────────────────────────────────────────────────
    let app = Router::new()
        // ── Status Surface ────────────────────────────────────────────────────
        .route("/",           get(index))
        .route("/health",     get(health))
        .route("/status",     get(get_status))
        .route("/price",      get(get_price))
        .route("/start",      post(start_bot))
        .route("/stop",       post(stop_bot))
        // ── Signal Ingestion ──────────────────────────────────────────────────
        .route("/webhook",    post(handle_webhook))
        // ── Monitor Stream ────────────────────────────────────────────────────
        .route("/ws/monitor", get(ws_monitor))
        // ── Middleware ────────────────────────────────────────────────────────
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // ── 8. Bind & Serve ───────────────────────────────────────────────────────
    info!(?addr, "🚀 Daybreak server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
