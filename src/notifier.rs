//! # notifier — Telegram message push
//!
//! Best-effort by contract: every transport error is swallowed and logged,
//! nothing retries, and no call blocks past its own request timeout. A
//! missing token or chat id disables the notifier instead of failing boot.

use serde_json::json;
use tracing::{debug, warn};

use crate::models::{Direction, SessionSummary, Signal, Trade, TradeOutcome};

/// Outbound request deadline. Telegram is slow sometimes; the trading loop
/// must not be.
const SEND_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

// ─── Notifier ─────────────────────────────────────────────────────────────────

pub struct Notifier {
    client: reqwest::Client,
    /// None → notifications disabled (no token / chat id configured).
    credentials: Option<(String, String)>,
}

impl Notifier {
    pub fn new(client: reqwest::Client, token: Option<String>, chat_id: Option<String>) -> Self {
        let credentials = match (token, chat_id) {
            (Some(token), Some(chat_id)) => Some((token, chat_id)),
            _ => {
                warn!("TELEGRAM_TOKEN / TELEGRAM_CHAT_ID not set — notifications disabled");
                None
            }
        };
        Self { client, credentials }
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// The configured chat id, used by the command bot to filter inbound chats.
    pub fn chat_id(&self) -> Option<&str> {
        self.credentials.as_ref().map(|(_, chat_id)| chat_id.as_str())
    }

    /// Push `text` to the configured chat. Returns whether Telegram accepted
    /// it; `false` covers disabled, transport failure and API rejection alike.
    pub async fn notify(&self, text: &str) -> bool {
        let Some((_, chat_id)) = &self.credentials else {
            return false;
        };
        self.send_to(&chat_id.clone(), text).await
    }

    /// Send to an explicit chat id (command bot replies).
    pub async fn send_to(&self, chat_id: &str, text: &str) -> bool {
        let Some((token, _)) = &self.credentials else {
            return false;
        };

        let url = format!("https://api.telegram.org/bot{token}/sendMessage");
        let body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        let result = self
            .client
            .post(&url)
            .json(&body)
            .timeout(SEND_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                debug!(chars = text.len(), "Telegram notification sent");
                true
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "Telegram rejected message — skipped");
                false
            }
            Err(e) => {
                warn!(error = %e, "Telegram unreachable — notification skipped");
                false
            }
        }
    }
}

// ─── Message Formatting ───────────────────────────────────────────────────────

pub fn format_signal_alert(signal: &Signal) -> String {
    format!(
        "🔔 *{} signal detected*\nPrice: {:.5}\nRSI: {:.1}\nConfidence: {}%",
        signal.direction, signal.price, signal.rsi, signal.confidence
    )
}

pub fn format_trade(trade: &Trade, capital: f64) -> String {
    let outcome = match trade.outcome {
        TradeOutcome::Win => "✅ WIN",
        TradeOutcome::Loss => "❌ LOSS",
        TradeOutcome::Submitted => "📤 SUBMITTED",
    };
    format!(
        "{outcome} *{} trade*\nEntry: {:.5}\nResult: {}${:.2}\nCapital: ${capital:.2}",
        trade.direction,
        trade.entry_price,
        if trade.result < 0.0 { "-" } else { "+" },
        trade.result.abs(),
    )
}

pub fn format_session_started(mode: &str, symbol: &str) -> String {
    format!("🤖 Trading session *STARTED*\nSymbol: {symbol}\nMode: {mode}")
}

pub fn format_session_stopped(summary: &SessionSummary) -> String {
    format!(
        "🛑 Trading session *STOPPED*\nTrades today: {}\nNet P&L: {}${:.2}\nCapital: ${:.2}",
        summary.trades_today,
        if summary.net_pnl < 0.0 { "-" } else { "+" },
        summary.net_pnl.abs(),
        summary.capital,
    )
}

pub fn format_limit_reached(reason: &str, summary: &SessionSummary) -> String {
    format!(
        "⛔ *Daily limit reached*\n{reason}\nTrades: {} · Net: {}${:.2} · Capital: ${:.2}",
        summary.trades_today,
        if summary.net_pnl < 0.0 { "-" } else { "+" },
        summary.net_pnl.abs(),
        summary.capital,
    )
}

pub fn format_webhook_alert(side: Direction, price: f64, vwap: f64) -> String {
    format!(
        "📣 *{side} alert received*\nPrice: {price:.5}\nVWAP: {vwap:.5}\nAll conditions confirmed"
    )
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_signal() -> Signal {
        Signal {
            signal_id: uuid::Uuid::new_v4(),
            direction: Direction::Buy,
            price: 1.08423,
            rsi: 32.1,
            confidence: 80,
            band_touch: true,
            detected_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn disabled_without_credentials() {
        let notifier = Notifier::new(reqwest::Client::new(), None, None);
        assert!(!notifier.is_enabled());
    }

    #[test]
    fn enabled_with_credentials() {
        let notifier = Notifier::new(
            reqwest::Client::new(),
            Some("token".into()),
            Some("12345".into()),
        );
        assert!(notifier.is_enabled());
        assert_eq!(notifier.chat_id(), Some("12345"));
    }

    #[tokio::test]
    async fn notify_returns_false_when_disabled() {
        let notifier = Notifier::new(reqwest::Client::new(), Some("token".into()), None);
        assert!(!notifier.notify("hello").await);
    }

    #[test]
    fn signal_alert_contains_direction_and_confidence() {
        let text = format_signal_alert(&make_signal());
        assert!(text.contains("BUY"));
        assert!(text.contains("80%"));
        assert!(text.contains("1.08423"));
    }

    #[test]
    fn trade_message_signs_losses() {
        let trade = Trade::new(Direction::Sell, 1.0850, -0.20, TradeOutcome::Loss);
        let text = format_trade(&trade, 99.80);
        assert!(text.contains("-$0.20"));
        assert!(text.contains("$99.80"));
    }

    #[test]
    fn stop_message_carries_summary() {
        let summary = SessionSummary {
            trades_today: 5,
            net_pnl: 2.0,
            capital: 102.0,
        };
        let text = format_session_stopped(&summary);
        assert!(text.contains("Trades today: 5"));
        assert!(text.contains("+$2.00"));
        assert!(text.contains("$102.00"));
    }
}
