//! # models::trade
//!
//! Defines [`Trade`] — one executed (or submitted) order and its monetary
//! result against demo capital.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Direction;

// ─── TradeOutcome ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeOutcome {
    /// Demo draw paid `risk × reward_ratio`.
    Win,
    /// Demo draw cost `risk`.
    Loss,
    /// Live order accepted by the broker; result settles broker-side.
    Submitted,
}

// ─── Trade ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: Uuid,
    pub direction: Direction,
    pub entry_price: f64,
    /// Signed monetary result. Zero for `Submitted` live orders.
    pub result: f64,
    pub outcome: TradeOutcome,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    pub fn new(direction: Direction, entry_price: f64, result: f64, outcome: TradeOutcome) -> Self {
        Self {
            trade_id: Uuid::new_v4(),
            direction,
            entry_price,
            result,
            outcome,
            executed_at: Utc::now(),
        }
    }
}
