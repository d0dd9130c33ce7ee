//! # market::synthetic
//!
//! Bounded random-walk tick generator — stands in for the live feed during
//! development and whenever the feed has degraded.

use chrono::Utc;
use rand::Rng;

use crate::models::PriceTick;

/// Maximum per-tick drift of the mid price.
const WALK_STEP: f64 = 0.0004;
/// Fixed synthetic spread (1.2 pips).
const SPREAD: f64 = 0.00012;

// ─── SyntheticWalk ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SyntheticWalk {
    symbol: String,
    mid: f64,
    /// Plausible instrument range the walk is clamped to.
    floor: f64,
    ceiling: f64,
}

impl SyntheticWalk {
    /// EURUSD-calibrated walk: seeded at 1.0850, clamped to [1.0500, 1.1200].
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            mid: 1.0850,
            floor: 1.0500,
            ceiling: 1.1200,
        }
    }

    pub fn next_tick(&mut self) -> PriceTick {
        let step = rand::thread_rng().gen_range(-WALK_STEP..=WALK_STEP);
        self.mid = (self.mid + step).clamp(self.floor, self.ceiling);

        PriceTick {
            symbol: self.symbol.clone(),
            bid: self.mid - SPREAD / 2.0,
            ask: self.mid + SPREAD / 2.0,
            time: Utc::now(),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_stays_in_instrument_range() {
        let mut walk = SyntheticWalk::new("EURUSD");
        for _ in 0..10_000 {
            let tick = walk.next_tick();
            let mid = tick.mid();
            assert!(mid >= 1.0500 - SPREAD && mid <= 1.1200 + SPREAD, "mid {mid} escaped range");
        }
    }

    #[test]
    fn ask_always_above_bid() {
        let mut walk = SyntheticWalk::new("EURUSD");
        for _ in 0..100 {
            let tick = walk.next_tick();
            assert!(tick.ask > tick.bid);
        }
    }

    #[test]
    fn consecutive_ticks_drift_bounded() {
        let mut walk = SyntheticWalk::new("EURUSD");
        let mut prev = walk.next_tick().mid();
        for _ in 0..1_000 {
            let mid = walk.next_tick().mid();
            assert!((mid - prev).abs() <= WALK_STEP + 1e-12);
            prev = mid;
        }
    }
}
