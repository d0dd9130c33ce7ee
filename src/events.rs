//! # events
//!
//! Defines [`BotEvent`] — everything the system broadcasts to WebSocket
//! monitor clients.
//!
//! Events go through `tokio::sync::broadcast::Sender<String>` pre-serialized
//! as JSON, which sidesteps `Clone` constraints on the channel payload.

use serde::Serialize;

use crate::models::{SessionSummary, Signal, Trade};

/// Every shape of event a monitor client can receive in real time.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BotEvent {
    /// Start command accepted — the session loop is live.
    SessionStarted,

    /// Stop command or daily limit — loop idle until the next start.
    SessionStopped { summary: SessionSummary },

    /// Detector produced an actionable signal this cycle.
    SignalDetected { signal: Box<Signal> },

    /// Executor settled (or submitted) a trade.
    TradeExecuted { trade: Box<Trade>, capital: f64 },

    /// A daily cap tripped; the controller stopped itself.
    LimitReached { reason: String },
}

impl BotEvent {
    /// Serialize for the WebSocket wire.
    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }
}
