//! # models::signal
//!
//! Defines [`Signal`] — the Signal Detector's verdict for one cycle.
//!
//! A signal lives for exactly one cycle: the Trade Executor consumes it,
//! and nothing beyond the capped operations list retains it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Direction ────────────────────────────────────────────────────────────────

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

// ─── Signal ───────────────────────────────────────────────────────────────────

/// One actionable detection, produced at most once per cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub signal_id: Uuid,
    pub direction: Direction,
    /// Mid price at detection time.
    pub price: f64,
    /// RSI value that supported the detection.
    pub rsi: f64,
    /// Ad hoc 0–100 score, used only as a threshold gate.
    pub confidence: u8,
    /// Whether price was within tolerance of the relevant Bollinger band.
    pub band_touch: bool,
    pub detected_at: DateTime<Utc>,
}
