//! # engine::indicators
//!
//! Derives the cycle's [`IndicatorSnapshot`] from the rolling mid-price
//! window (oldest first, newest last).
//!
//! Short windows return neutral placeholders instead of failing: RSI and the
//! Bollinger bands are `None` until enough samples have accumulated, and the
//! detector guards on their presence.

// ─── Parameters ───────────────────────────────────────────────────────────────

pub const EMA_FAST_SPAN: usize = 9;
pub const EMA_SLOW_SPAN: usize = 21;
/// RSI over a simple rolling mean of the trailing 7 deltas.
pub const RSI_PERIOD: usize = 7;
pub const BAND_PERIOD: usize = 20;
pub const BAND_STDDEV_MULT: f64 = 2.0;

/// Midpoint reported when RSI has too few samples.
pub const RSI_NEUTRAL: f64 = 50.0;

// ─── IndicatorSnapshot ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct IndicatorSnapshot {
    /// Newest price in the window.
    pub price: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    /// `None` until `RSI_PERIOD + 1` samples exist.
    pub rsi: Option<f64>,
    /// `None` until `BAND_PERIOD` samples exist.
    pub band_upper: Option<f64>,
    pub band_middle: Option<f64>,
    pub band_lower: Option<f64>,
}

impl IndicatorSnapshot {
    /// Compute from the current window. `None` only when the window is empty.
    pub fn compute(prices: &[f64]) -> Option<Self> {
        let &price = prices.last()?;

        let (band_middle, band_upper, band_lower) = match bollinger(prices) {
            Some((middle, upper, lower)) => (Some(middle), Some(upper), Some(lower)),
            None => (None, None, None),
        };

        Some(Self {
            price,
            ema_fast: ema(prices, EMA_FAST_SPAN),
            ema_slow: ema(prices, EMA_SLOW_SPAN),
            rsi: rsi(prices, RSI_PERIOD),
            band_upper,
            band_middle,
            band_lower,
        })
    }

    pub fn rsi_or_neutral(&self) -> f64 {
        self.rsi.unwrap_or(RSI_NEUTRAL)
    }
}

// ─── EMA ──────────────────────────────────────────────────────────────────────

/// Exponential moving average, weight `2 / (span + 1)`, seeded on the first
/// sample and folded across the whole window.
fn ema(prices: &[f64], span: usize) -> f64 {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut iter = prices.iter();
    let mut value = *iter.next().unwrap_or(&0.0);
    for &price in iter {
        value = price * alpha + value * (1.0 - alpha);
    }
    value
}

// ─── RSI ──────────────────────────────────────────────────────────────────────

/// RSI over the simple mean of the trailing `period` gains vs losses.
///
/// `avg_loss == 0 → 100` exactly. Needs `period + 1` samples for `period`
/// deltas; otherwise `None`.
fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if prices.len() < period + 1 {
        return None;
    }

    let tail = &prices[prices.len() - (period + 1)..];
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for pair in tail.windows(2) {
        let delta = pair[1] - pair[0];
        if delta > 0.0 {
            gain_sum += delta;
        } else {
            loss_sum += -delta;
        }
    }

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}

// ─── Bollinger Bands ──────────────────────────────────────────────────────────

/// (middle, upper, lower) over the last `BAND_PERIOD` samples, bands at
/// ±`BAND_STDDEV_MULT` population standard deviations.
fn bollinger(prices: &[f64]) -> Option<(f64, f64, f64)> {
    if prices.len() < BAND_PERIOD {
        return None;
    }

    let tail = &prices[prices.len() - BAND_PERIOD..];
    let middle = tail.iter().sum::<f64>() / BAND_PERIOD as f64;
    let variance = tail
        .iter()
        .map(|p| {
            let diff = p - middle;
            diff * diff
        })
        .sum::<f64>()
        / BAND_PERIOD as f64;
    let offset = BAND_STDDEV_MULT * variance.sqrt();

    Some((middle, middle + offset, middle - offset))
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(n: usize, price: f64) -> Vec<f64> {
        vec![price; n]
    }

    #[test]
    fn empty_window_yields_nothing() {
        assert!(IndicatorSnapshot::compute(&[]).is_none());
    }

    #[test]
    fn short_window_is_neutral_not_an_error() {
        let snapshot = IndicatorSnapshot::compute(&flat(5, 1.0850)).unwrap();
        assert!(snapshot.rsi.is_none());
        assert!(snapshot.band_upper.is_none());
        assert!((snapshot.rsi_or_neutral() - RSI_NEUTRAL).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_is_100_when_no_losses() {
        let prices: Vec<f64> = (0..10).map(|i| 1.0800 + i as f64 * 0.0005).collect();
        let snapshot = IndicatorSnapshot::compute(&prices).unwrap();
        assert_eq!(snapshot.rsi, Some(100.0));
    }

    #[test]
    fn rsi_is_0_when_no_gains() {
        let prices: Vec<f64> = (0..10).map(|i| 1.0900 - i as f64 * 0.0005).collect();
        let snapshot = IndicatorSnapshot::compute(&prices).unwrap();
        assert_eq!(snapshot.rsi, Some(0.0));
    }

    #[test]
    fn rsi_always_in_range() {
        let prices: Vec<f64> = (0..40)
            .map(|i| 1.0850 + ((i % 7) as f64 - 3.0) * 0.0004)
            .collect();
        for end in (RSI_PERIOD + 1)..prices.len() {
            let snapshot = IndicatorSnapshot::compute(&prices[..end]).unwrap();
            let rsi = snapshot.rsi.unwrap();
            assert!((0.0..=100.0).contains(&rsi), "RSI {rsi} out of range");
        }
    }

    #[test]
    fn bands_need_twenty_samples() {
        let snapshot = IndicatorSnapshot::compute(&flat(19, 1.0850)).unwrap();
        assert!(snapshot.band_middle.is_none());

        let snapshot = IndicatorSnapshot::compute(&flat(20, 1.0850)).unwrap();
        assert!(snapshot.band_middle.is_some());
    }

    #[test]
    fn bands_collapse_on_constant_prices() {
        let snapshot = IndicatorSnapshot::compute(&flat(20, 1.0850)).unwrap();
        assert!((snapshot.band_upper.unwrap() - 1.0850).abs() < 1e-12);
        assert!((snapshot.band_lower.unwrap() - 1.0850).abs() < 1e-12);
    }

    #[test]
    fn bands_are_symmetric_around_middle() {
        let prices: Vec<f64> = (0..20).map(|i| 1.0800 + (i as f64) * 0.0003).collect();
        let snapshot = IndicatorSnapshot::compute(&prices).unwrap();
        let middle = snapshot.band_middle.unwrap();
        let up = snapshot.band_upper.unwrap() - middle;
        let down = middle - snapshot.band_lower.unwrap();
        assert!((up - down).abs() < 1e-12);
    }

    #[test]
    fn fast_ema_tracks_price_closer_than_slow() {
        // Steady uptrend: the shorter span must sit closer to the last price.
        let prices: Vec<f64> = (0..30).map(|i| 1.0800 + i as f64 * 0.0005).collect();
        let snapshot = IndicatorSnapshot::compute(&prices).unwrap();
        let last = *prices.last().unwrap();
        assert!((last - snapshot.ema_fast).abs() < (last - snapshot.ema_slow).abs());
    }
}
