//! # config — Runtime configuration from environment variables
//!
//! Every knob the bot recognizes, with the defaults the demo account runs
//! under. `.env` is loaded by `main` before this is read; a missing
//! Telegram token degrades notifications to disabled rather than aborting.

use std::time::Duration;

use anyhow::{bail, Context};
use chrono::{DateTime, Datelike, NaiveTime, Utc};

// ─── Execution Mode ───────────────────────────────────────────────────────────

/// How the executor settles trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Simulated win/loss draw against demo capital. No broker involved.
    Demo,
    /// Real order-send to the broker bridge (`BRIDGE_URL`).
    Live,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Demo => write!(f, "DEMO"),
            ExecutionMode::Live => write!(f, "LIVE"),
        }
    }
}

// ─── Trading Window ───────────────────────────────────────────────────────────

/// Time-of-day range `[start, end)` in UTC, weekdays only.
#[derive(Debug, Clone, Copy)]
pub struct TradingWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TradingWindow {
    pub fn parse(start: &str, end: &str) -> anyhow::Result<Self> {
        let start = NaiveTime::parse_from_str(start, "%H:%M")
            .with_context(|| format!("TRADING_START '{start}' is not HH:MM"))?;
        let end = NaiveTime::parse_from_str(end, "%H:%M")
            .with_context(|| format!("TRADING_END '{end}' is not HH:MM"))?;
        if start >= end {
            bail!("Trading window start {start} must be before end {end}");
        }
        Ok(Self { start, end })
    }

    /// Saturday and Sunday are always outside the window.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        if now.weekday().number_from_monday() > 5 {
            return false;
        }
        let t = now.time();
        t >= self.start && t < self.end
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    /// Address Axum listens on.
    pub bind_addr: String,
    /// Instrument the whole process trades, e.g. "EURUSD".
    pub symbol: String,
    /// Starting demo capital.
    pub capital: f64,
    /// Monetary risk per trade.
    pub risk_per_trade: f64,
    pub stop_loss_pips: u32,
    pub take_profit_pips: u32,
    /// Daily trade cap (0 = unlimited).
    pub max_trades_per_day: u32,
    /// Daily cumulative-loss cap.
    pub max_daily_loss: f64,
    pub window: TradingWindow,
    /// Session Controller wakeup interval.
    pub cycle_interval: Duration,
    /// Extra sleep after an executed trade.
    pub cooldown: Duration,
    /// Delay between signal alert and execution.
    pub confirmation_delay: Duration,
    pub execution_mode: ExecutionMode,
    /// Broker bridge base URL (live mode only).
    pub bridge_url: Option<String>,
    /// Market data feed base URL. Unset → synthetic generator.
    pub feed_url: Option<String>,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let mode_str = std::env::var("EXECUTION_MODE")
            .unwrap_or_else(|_| "demo".to_string())
            .to_lowercase();

        let execution_mode = match mode_str.as_str() {
            "demo" => ExecutionMode::Demo,
            "live" => ExecutionMode::Live,
            other => bail!("Unknown EXECUTION_MODE: '{other}'. Use 'demo' or 'live'"),
        };

        let bridge_url = std::env::var("BRIDGE_URL").ok();
        if execution_mode == ExecutionMode::Live && bridge_url.is_none() {
            bail!("EXECUTION_MODE=live requires BRIDGE_URL");
        }

        let window = TradingWindow::parse(
            &std::env::var("TRADING_START").unwrap_or_else(|_| "08:00".to_string()),
            &std::env::var("TRADING_END").unwrap_or_else(|_| "12:00".to_string()),
        )?;

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            symbol: std::env::var("SYMBOL").unwrap_or_else(|_| "EURUSD".to_string()),
            capital: env_f64("CAPITAL", 100.0),
            risk_per_trade: env_f64("RISK_PER_TRADE", 0.20),
            stop_loss_pips: env_u32("STOP_LOSS_PIPS", 7),
            take_profit_pips: env_u32("TAKE_PROFIT_PIPS", 14),
            max_trades_per_day: env_u32("MAX_TRADES_PER_DAY", 5),
            max_daily_loss: env_f64("MAX_DAILY_LOSS", 0.40),
            window,
            cycle_interval: Duration::from_secs(env_u64("CYCLE_SECS", 10)),
            cooldown: Duration::from_secs(env_u64("COOLDOWN_SECS", 30)),
            confirmation_delay: Duration::from_secs(env_u64("CONFIRMATION_DELAY_SECS", 2)),
            execution_mode,
            bridge_url,
            feed_url: std::env::var("FEED_URL").ok(),
            telegram_token: std::env::var("TELEGRAM_TOKEN").ok().filter(|s| !s.is_empty()),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID").ok().filter(|s| !s.is_empty()),
        })
    }

    /// Reward-to-risk ratio implied by the TP/SL pip offsets (14/7 = 2).
    pub fn reward_ratio(&self) -> f64 {
        self.take_profit_pips as f64 / self.stop_loss_pips as f64
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_window() -> TradingWindow {
        TradingWindow::parse("08:00", "12:00").unwrap()
    }

    /// 2026-01-05 is a Monday.
    fn monday_at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, h, m, 0).unwrap()
    }

    #[test]
    fn window_excludes_before_start() {
        assert!(!make_window().contains(monday_at(7, 59)));
    }

    #[test]
    fn window_includes_start() {
        assert!(make_window().contains(monday_at(8, 0)));
    }

    #[test]
    fn window_includes_last_minute() {
        assert!(make_window().contains(monday_at(11, 59)));
    }

    #[test]
    fn window_is_half_open() {
        assert!(!make_window().contains(monday_at(12, 0)));
        assert!(!make_window().contains(monday_at(12, 1)));
    }

    #[test]
    fn window_excludes_weekend_regardless_of_time() {
        // 2026-01-10 Saturday, 2026-01-11 Sunday
        let saturday = Utc.with_ymd_and_hms(2026, 1, 10, 9, 30, 0).unwrap();
        let sunday = Utc.with_ymd_and_hms(2026, 1, 11, 9, 30, 0).unwrap();
        assert!(!make_window().contains(saturday));
        assert!(!make_window().contains(sunday));
    }

    #[test]
    fn window_rejects_inverted_range() {
        assert!(TradingWindow::parse("12:00", "08:00").is_err());
    }

    #[test]
    fn reward_ratio_from_pips() {
        let window = make_window();
        let config = Config {
            bind_addr: String::new(),
            symbol: "EURUSD".into(),
            capital: 100.0,
            risk_per_trade: 0.20,
            stop_loss_pips: 7,
            take_profit_pips: 14,
            max_trades_per_day: 5,
            max_daily_loss: 0.40,
            window,
            cycle_interval: Duration::from_secs(10),
            cooldown: Duration::from_secs(30),
            confirmation_delay: Duration::from_secs(2),
            execution_mode: ExecutionMode::Demo,
            bridge_url: None,
            feed_url: None,
            telegram_token: None,
            telegram_chat_id: None,
        };
        assert!((config.reward_ratio() - 2.0).abs() < f64::EPSILON);
    }
}
