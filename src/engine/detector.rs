//! # engine::detector
//!
//! Threshold rules that classify the cycle's snapshot as BUY, SELL or
//! nothing.
//!
//! ```text
//! BUY  : price > EMA(9)  AND RSI < 35 AND RSI rising  vs previous cycle
//! SELL : price < EMA(9)  AND RSI > 65 AND RSI falling vs previous cycle
//! ```
//!
//! Touching the relevant Bollinger band (within a small tolerance) adds a
//! confidence bonus. BUY and SELL use opposite RSI ranges, so at most one
//! direction can fire per snapshot.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::engine::indicators::IndicatorSnapshot;
use crate::models::{Direction, Signal};

// ─── Rule Parameters ──────────────────────────────────────────────────────────

pub const RSI_OVERSOLD: f64 = 35.0;
pub const RSI_OVERBOUGHT: f64 = 65.0;
/// Band proximity tolerance: price within 0.02% of the band counts as a touch.
pub const BAND_TOLERANCE: f64 = 0.0002;

pub const BASE_CONFIDENCE: u8 = 70;
pub const BAND_BONUS: u8 = 10;
/// A signal is actionable only above this confidence.
pub const MIN_CONFIDENCE: u8 = 65;

// ─── Detection ────────────────────────────────────────────────────────────────

/// Classify the current snapshot against the previous cycle's.
///
/// Returns `None` when the window is still warming up (bands or RSI absent),
/// when there is no previous snapshot to compare RSI momentum against, or
/// when no rule fires above [`MIN_CONFIDENCE`].
pub fn detect(current: &IndicatorSnapshot, previous: Option<&IndicatorSnapshot>) -> Option<Signal> {
    let band_lower = current.band_lower?;
    let band_upper = current.band_upper?;
    let rsi = current.rsi?;
    let prev_rsi = previous?.rsi?;

    let price = current.price;

    let (direction, band_touch) = if price > current.ema_fast
        && rsi < RSI_OVERSOLD
        && rsi > prev_rsi
    {
        (Direction::Buy, price <= band_lower * (1.0 + BAND_TOLERANCE))
    } else if price < current.ema_fast && rsi > RSI_OVERBOUGHT && rsi < prev_rsi {
        (Direction::Sell, price >= band_upper * (1.0 - BAND_TOLERANCE))
    } else {
        return None;
    };

    let confidence = BASE_CONFIDENCE + if band_touch { BAND_BONUS } else { 0 };
    if confidence <= MIN_CONFIDENCE {
        debug!(%direction, confidence, "Signal below confidence gate — dropped");
        return None;
    }

    Some(Signal {
        signal_id: Uuid::new_v4(),
        direction,
        price,
        rsi,
        confidence,
        band_touch,
        detected_at: Utc::now(),
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_snapshot(price: f64, ema_fast: f64, rsi: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            price,
            ema_fast,
            ema_slow: ema_fast,
            rsi: Some(rsi),
            band_upper: Some(1.0900),
            band_middle: Some(1.0850),
            band_lower: Some(1.0800),
        }
    }

    #[test]
    fn buy_fires_on_oversold_rising_rsi() {
        let prev = make_snapshot(1.0860, 1.0855, 28.0);
        let current = make_snapshot(1.0860, 1.0855, 31.0);
        let signal = detect(&current, Some(&prev)).unwrap();
        assert_eq!(signal.direction, Direction::Buy);
        assert_eq!(signal.confidence, BASE_CONFIDENCE);
        assert!(!signal.band_touch);
    }

    #[test]
    fn sell_fires_on_overbought_falling_rsi() {
        let prev = make_snapshot(1.0845, 1.0850, 72.0);
        let current = make_snapshot(1.0845, 1.0850, 69.0);
        let signal = detect(&current, Some(&prev)).unwrap();
        assert_eq!(signal.direction, Direction::Sell);
    }

    #[test]
    fn band_touch_raises_confidence() {
        // Price at the lower band within tolerance.
        let prev = make_snapshot(1.0801, 1.0799, 28.0);
        let current = make_snapshot(1.0801, 1.0799, 31.0);
        let signal = detect(&current, Some(&prev)).unwrap();
        assert!(signal.band_touch);
        assert_eq!(signal.confidence, BASE_CONFIDENCE + BAND_BONUS);
    }

    #[test]
    fn flat_rsi_blocks_buy() {
        let prev = make_snapshot(1.0860, 1.0855, 31.0);
        let current = make_snapshot(1.0860, 1.0855, 31.0);
        assert!(detect(&current, Some(&prev)).is_none());
    }

    #[test]
    fn no_signal_without_previous_snapshot() {
        let current = make_snapshot(1.0860, 1.0855, 31.0);
        assert!(detect(&current, None).is_none());
    }

    #[test]
    fn no_signal_while_bands_warm_up() {
        let prev = make_snapshot(1.0860, 1.0855, 28.0);
        let mut current = make_snapshot(1.0860, 1.0855, 31.0);
        current.band_lower = None;
        current.band_upper = None;
        assert!(detect(&current, Some(&prev)).is_none());
    }

    #[test]
    fn buy_and_sell_are_mutually_exclusive() {
        // Sweep RSI across the whole range: no snapshot may satisfy both
        // rule sets, whatever side of the EMA price sits on.
        for rsi10 in 0..=1000 {
            let rsi = rsi10 as f64 / 10.0;
            for &(price, ema) in &[(1.0860, 1.0855), (1.0845, 1.0850)] {
                let prev_low = make_snapshot(price, ema, rsi - 5.0);
                let prev_high = make_snapshot(price, ema, rsi + 5.0);
                let current = make_snapshot(price, ema, rsi);

                let buyish = detect(&current, Some(&prev_low));
                let sellish = detect(&current, Some(&prev_high));
                if let (Some(a), Some(b)) = (&buyish, &sellish) {
                    panic!("both directions fired at rsi {rsi}: {:?} / {:?}", a.direction, b.direction);
                }
            }
        }
    }

    #[test]
    fn neutral_rsi_yields_nothing() {
        let prev = make_snapshot(1.0860, 1.0855, 48.0);
        let current = make_snapshot(1.0860, 1.0855, 52.0);
        assert!(detect(&current, Some(&prev)).is_none());
    }
}
