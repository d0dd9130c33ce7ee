//! # models::tick
//!
//! Defines [`PriceTick`], one quote for the configured instrument.
//!
//! Ticks are immutable once emitted by the market feed; the Session
//! Controller keeps only the mid prices of the most recent ones in a bounded
//! rolling window, and the latest full tick is published to shared state for
//! `GET /price`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single price quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTick {
    /// The trading symbol, e.g. `"EURUSD"`.
    pub symbol: String,

    /// The current **bid** price (price at which market makers buy from us).
    pub bid: f64,

    /// The current **ask** price (price at which market makers sell to us).
    pub ask: f64,

    /// UTC timestamp when the tick was observed.
    pub time: DateTime<Utc>,
}

impl PriceTick {
    /// Mid-point price: `(bid + ask) / 2`.
    #[inline]
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }
}
