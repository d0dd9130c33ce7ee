//! # telegram — Command Bot
//!
//! Long-polls `getUpdates` so the operator can drive the bot from chat:
//!
//! | Command       | Effect                         |
//! |---------------|--------------------------------|
//! | `/start` `/help` | command overview            |
//! | `/status`     | session snapshot               |
//! | `/startbot`   | start the trading session      |
//! | `/stopbot`    | stop + summary                 |
//! | `/operations` | last five operations today     |
//! | `/capital`    | capital & risk settings        |
//!
//! Only the configured chat id is obeyed. Runs only when the token and chat
//! id are present; polling errors are logged and the loop backs off briefly.

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::{info, warn};

use crate::engine::session;
use crate::models::SessionState;
use crate::state::SharedState;

/// Telegram long-poll hold time; the request timeout sits just above it.
const POLL_TIMEOUT_SECS: u64 = 25;
const POLL_BACKOFF: std::time::Duration = std::time::Duration::from_secs(5);

// ─── Telegram API Payloads ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

// ─── Bot Loop ─────────────────────────────────────────────────────────────────

/// Spawn the command loop, or `None` when Telegram is not configured.
pub fn spawn(state: SharedState) -> Option<tokio::task::JoinHandle<()>> {
    let token = state.config.telegram_token.clone()?;
    let chat_id = state.notifier.chat_id()?.to_string();
    Some(tokio::spawn(run(state, token, chat_id)))
}

async fn run(state: SharedState, token: String, chat_id: String) {
    info!("🤖 Telegram command bot started");
    let mut offset: i64 = 0;

    loop {
        match get_updates(&state.http_client, &token, offset).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);

                    let Some(message) = update.message else { continue };
                    // A public bot can be messaged by anyone; obey only ours.
                    if message.chat.id.to_string() != chat_id {
                        continue;
                    }
                    let Some(text) = message.text else { continue };
                    let command = text.split_whitespace().next().unwrap_or("");
                    if !command.starts_with('/') {
                        continue;
                    }

                    let reply = handle_command(command, &state).await;
                    state.notifier.send_to(&chat_id, &reply).await;
                }
            }
            Err(e) => {
                warn!(error = %e, "Telegram poll failed — backing off");
                tokio::time::sleep(POLL_BACKOFF).await;
            }
        }
    }
}

async fn get_updates(
    client: &reqwest::Client,
    token: &str,
    offset: i64,
) -> anyhow::Result<Vec<Update>> {
    let url = format!(
        "https://api.telegram.org/bot{token}/getUpdates?timeout={POLL_TIMEOUT_SECS}&offset={offset}"
    );

    let resp: UpdatesResponse = client
        .get(&url)
        .timeout(std::time::Duration::from_secs(POLL_TIMEOUT_SECS + 5))
        .send()
        .await
        .context("Telegram unreachable")?
        .error_for_status()?
        .json()
        .await
        .context("Failed to parse getUpdates response")?;

    if !resp.ok {
        bail!("Telegram getUpdates returned ok=false");
    }
    Ok(resp.result)
}

// ─── Command Handling ─────────────────────────────────────────────────────────

async fn handle_command(command: &str, state: &SharedState) -> String {
    match command {
        "/start" | "/help" => help_text(),
        "/status" => {
            let session = state.session.read().await;
            format_status(&session, &state.config.execution_mode.to_string())
        }
        "/startbot" => match session::start(state).await {
            Ok(()) => "✅ *Trading session STARTED*".to_string(),
            Err(reason) => format!("⚠️ Cannot start: {reason}"),
        },
        "/stopbot" => match session::stop(state).await {
            Ok(summary) => format!(
                "🛑 *Trading session STOPPED*\nTrades: {} · Net: ${:.2}",
                summary.trades_today, summary.net_pnl
            ),
            Err(reason) => format!("⚠️ Cannot stop: {reason}"),
        },
        "/operations" => {
            let session = state.session.read().await;
            format_operations(&session)
        }
        "/capital" => {
            let session = state.session.read().await;
            format!(
                "💰 *Capital Management*\nCapital: ${:.2}\nRisk per trade: ${:.2}\nSL: {} pips · TP: {} pips\nReward ratio: 1:{:.0}",
                session.capital,
                state.config.risk_per_trade,
                state.config.stop_loss_pips,
                state.config.take_profit_pips,
                state.config.reward_ratio(),
            )
        }
        _ => "Unknown command — try /help".to_string(),
    }
}

fn help_text() -> String {
    "🤖 *Trading Bot Controller*\n\n\
     /status - session snapshot\n\
     /startbot - start trading\n\
     /stopbot - stop trading\n\
     /operations - today's operations\n\
     /capital - capital management\n\
     /help - this message"
        .to_string()
}

fn format_status(session: &SessionState, mode: &str) -> String {
    let running = if session.running { "✅ RUNNING" } else { "❌ STOPPED" };
    format!(
        "📊 *Bot Status*\n\nState: {running}\nTrades today: {}\nProfit: ${:.2}\nLoss: ${:.2}\nNet: ${:.2}\nCapital: ${:.2}\nMode: {mode}",
        session.trades_today,
        session.profit_today,
        session.loss_today,
        session.net_today(),
        session.capital,
    )
}

fn format_operations(session: &SessionState) -> String {
    if session.operations.is_empty() {
        return "📭 No operations today".to_string();
    }

    let mut text = format!("📋 *Operations today: {}*\n\n", session.trades_today);
    let last_five = session.operations.iter().rev().take(5).rev();
    for (i, op) in last_five.enumerate() {
        text.push_str(&format!(
            "{}. {} ${:.2}\n",
            i + 1,
            op.direction,
            op.result
        ));
    }
    text
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ExecutionMode, TradingWindow};
    use crate::models::{Direction, Trade, TradeOutcome};
    use crate::state::build_state;
    use std::time::Duration;

    fn make_state() -> SharedState {
        build_state(Config {
            bind_addr: String::new(),
            symbol: "EURUSD".into(),
            capital: 100.0,
            risk_per_trade: 0.20,
            stop_loss_pips: 7,
            take_profit_pips: 14,
            max_trades_per_day: 5,
            max_daily_loss: 0.40,
            window: TradingWindow::parse("08:00", "12:00").unwrap(),
            cycle_interval: Duration::from_secs(10),
            cooldown: Duration::from_secs(30),
            confirmation_delay: Duration::from_secs(2),
            execution_mode: ExecutionMode::Demo,
            bridge_url: None,
            feed_url: None,
            telegram_token: None,
            telegram_chat_id: None,
        })
    }

    #[tokio::test]
    async fn status_reports_stopped_session() {
        let state = make_state();
        let reply = handle_command("/status", &state).await;
        assert!(reply.contains("❌ STOPPED"));
        assert!(reply.contains("$100.00"));
    }

    #[tokio::test]
    async fn startbot_flips_running_flag() {
        let state = make_state();
        let reply = handle_command("/startbot", &state).await;
        assert!(reply.contains("STARTED"));
        assert!(state.session.read().await.running);

        // Second start refuses.
        let reply = handle_command("/startbot", &state).await;
        assert!(reply.contains("already running"));
    }

    #[tokio::test]
    async fn unknown_command_points_at_help() {
        let state = make_state();
        let reply = handle_command("/frobnicate", &state).await;
        assert!(reply.contains("/help"));
    }

    #[tokio::test]
    async fn operations_lists_last_five() {
        let state = make_state();
        {
            let mut session = state.session.write().await;
            for _ in 0..7 {
                session.apply_trade(&Trade::new(
                    Direction::Buy,
                    1.0850,
                    0.40,
                    TradeOutcome::Win,
                ));
            }
        }
        let reply = handle_command("/operations", &state).await;
        assert!(reply.contains("Operations today: 7"));
        assert!(reply.contains("5. BUY"));
        assert!(!reply.contains("6. BUY"));
    }
}
