//! # state
//!
//! Top-level shared state injected into every Axum handler and owned by the
//! background loops: the session singleton, the latest tick, the broadcast
//! channel and the shared HTTP client.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::config::Config;
use crate::models::{PriceTick, SessionState};
use crate::notifier::Notifier;

// ─── AppState ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// The session singleton. Written by the controller loop and the
    /// executor, read by the Status Surface and the Telegram command bot.
    pub session: Arc<RwLock<SessionState>>,

    /// Latest tick from the market feed, for `GET /price`.
    pub last_tick: Arc<RwLock<Option<PriceTick>>>,

    /// Broadcast channel feeding WebSocket monitor clients.
    /// Payloads are pre-serialized JSON strings.
    pub broadcast_tx: broadcast::Sender<String>,

    /// reqwest Client shared system-wide (connection pooling); market feed,
    /// broker bridge and Telegram all go through it.
    pub http_client: reqwest::Client,

    pub notifier: Arc<Notifier>,

    /// Cycles the controller has woken up for, including skipped ones.
    pub cycle_count: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);
        let http_client = reqwest::Client::new();
        let notifier = Arc::new(Notifier::new(
            http_client.clone(),
            config.telegram_token.clone(),
            config.telegram_chat_id.clone(),
        ));

        Self {
            config: Arc::new(config.clone()),
            session: Arc::new(RwLock::new(SessionState::new(config.capital))),
            last_tick: Arc::new(RwLock::new(None)),
            broadcast_tx,
            http_client,
            notifier,
            cycle_count: Arc::new(AtomicU64::new(0)),
        }
    }

    // ── Helper Methods ────────────────────────────────────────────────────────

    /// Broadcast a BotEvent to every monitor client.
    /// Does not panic when no listener is subscribed.
    pub fn broadcast(&self, event: &crate::events::BotEvent) {
        // Err only means no receiver — fine for headless runs.
        let _ = self.broadcast_tx.send(event.to_json());
    }

    /// Publish the latest tick and mirror price into the session state.
    pub async fn record_tick(&self, tick: PriceTick) {
        {
            let mut session = self.session.write().await;
            session.last_price = Some(tick.mid());
            session.last_update = Some(tick.time);
        }
        let mut guard = self.last_tick.write().await;
        *guard = Some(tick);
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

pub fn build_state(config: Config) -> SharedState {
    Arc::new(AppState::new(config))
}
