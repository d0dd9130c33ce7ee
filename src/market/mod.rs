//! # market — Market Data Source
//!
//! One tick per cycle for the configured instrument.
//!
//! ## Data Sources (config-selected)
//! 1. Live feed — GET `{FEED_URL}/quote?symbol=...`, mapped to [`PriceTick`]
//! 2. Synthetic — bounded random walk, used when `FEED_URL` is unset or the
//!    feed has failed twice in a row
//!
//! Failures never cross this boundary: `next_tick` returns `None` for "no
//! data this cycle" and the caller skips the cycle.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::PriceTick;

pub mod synthetic;

use synthetic::SyntheticWalk;

/// Consecutive feed failures before degrading to the synthetic generator.
const MAX_FEED_FAILURES: u32 = 2;

// ─── Feed Response ────────────────────────────────────────────────────────────

/// Quote schema of the upstream feed.
#[derive(Debug, Deserialize)]
struct FeedQuote {
    bid: f64,
    ask: f64,
}

// ─── MarketFeed ───────────────────────────────────────────────────────────────

pub struct MarketFeed {
    client: reqwest::Client,
    symbol: String,
    feed_url: Option<String>,
    fallback: SyntheticWalk,
    consecutive_failures: u32,
    degraded: bool,
}

impl MarketFeed {
    pub fn new(client: reqwest::Client, symbol: &str, feed_url: Option<String>) -> Self {
        if feed_url.is_none() {
            warn!("FEED_URL not set — using synthetic market data");
        }
        Self {
            client,
            symbol: symbol.to_string(),
            feed_url,
            fallback: SyntheticWalk::new(symbol),
            consecutive_failures: 0,
            degraded: false,
        }
    }

    /// Fetch the next tick. `None` means "no data this cycle", never an error.
    pub async fn next_tick(&mut self) -> Option<PriceTick> {
        let Some(base_url) = self.feed_url.clone() else {
            return Some(self.fallback.next_tick());
        };

        if self.degraded {
            return Some(self.fallback.next_tick());
        }

        match self.fetch_quote(&base_url).await {
            Ok(tick) => {
                self.consecutive_failures = 0;
                Some(tick)
            }
            Err(e) => {
                self.consecutive_failures += 1;
                warn!(
                    error = %e,
                    failures = self.consecutive_failures,
                    "Market feed fetch failed"
                );
                if self.consecutive_failures >= MAX_FEED_FAILURES {
                    warn!("📉 Market feed degraded — switching to synthetic generator");
                    self.degraded = true;
                    return Some(self.fallback.next_tick());
                }
                None
            }
        }
    }

    async fn fetch_quote(&self, base_url: &str) -> anyhow::Result<PriceTick> {
        let url = format!("{base_url}/quote?symbol={}", self.symbol);

        let quote: FeedQuote = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(bid = quote.bid, ask = quote.ask, "Feed quote received");

        Ok(PriceTick {
            symbol: self.symbol.clone(),
            bid: quote.bid,
            ask: quote.ask,
            time: chrono::Utc::now(),
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn synthetic_only_without_feed_url() {
        let mut feed = MarketFeed::new(reqwest::Client::new(), "EURUSD", None);
        let tick = feed.next_tick().await.unwrap();
        assert_eq!(tick.symbol, "EURUSD");
        assert!(tick.ask > tick.bid);
    }

    #[tokio::test]
    async fn degrades_after_two_failures() {
        // Unroutable host: both attempts fail, second one flips to synthetic.
        let mut feed = MarketFeed::new(
            reqwest::Client::new(),
            "EURUSD",
            Some("http://127.0.0.1:1".to_string()),
        );
        assert!(feed.next_tick().await.is_none());
        let tick = feed.next_tick().await;
        assert!(tick.is_some(), "second failure should fall back to synthetic");
        assert!(feed.degraded);
    }
}
