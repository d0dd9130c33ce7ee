//! # engine::executor
//!
//! Turns an actionable [`Signal`] into a [`Trade`].
//!
//! Two variants behind one entry point, selected by `EXECUTION_MODE`:
//! - **demo** — Bernoulli win/loss draw scaled by signal confidence,
//!   settled against demo capital
//! - **live** — real order POSTed to the broker bridge `/order/send`,
//!   retcode 10009 = accepted
//!
//! State mutation always happens before the notification goes out, and a
//! failed notification never rolls back or retries the trade.

use rand::Rng;
use tracing::{error, info, warn};

use crate::config::ExecutionMode;
use crate::error::AppError;
use crate::events::BotEvent;
use crate::models::{Direction, Signal, Trade, TradeOutcome};
use crate::notifier::format_trade;
use crate::state::SharedState;

/// Smallest standard price increment for the modeled pair.
const PIP: f64 = 0.0001;
/// Monetary value of one pip at 0.01 lots.
const PIP_VALUE: f64 = 0.10;
/// Win probability is confidence-scaled but never exceeds this.
const MAX_WIN_PROBABILITY: f64 = 0.8;
const CONFIDENCE_SCALE: f64 = 0.9;

// ─── Bridge Request / Response ────────────────────────────────────────────────

/// Payload for the broker bridge `/order/send` endpoint.
#[derive(Debug, serde::Serialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub action: &'static str, // "BUY" | "SELL"
    pub volume: f64,
    pub price: f64,
    pub sl: f64,
    pub tp: f64,
    pub time_in_force: &'static str,
    pub comment: String,
    pub magic: u64,
}

/// Response from the broker bridge.
#[derive(Debug, serde::Deserialize)]
pub struct OrderResponse {
    /// Broker return code — 10009 = accepted.
    pub retcode: u32,
    /// Broker ticket (present when accepted).
    pub order: Option<u64>,
    pub comment: Option<String>,
}

// ─── Sizing & Settlement ──────────────────────────────────────────────────────

/// Probability the demo draw pays out: `min(0.8, confidence% × 0.9)`.
pub fn win_probability(confidence: u8) -> f64 {
    (confidence as f64 / 100.0 * CONFIDENCE_SCALE).min(MAX_WIN_PROBABILITY)
}

/// Signed monetary result of a settled demo trade.
pub fn settle(outcome: TradeOutcome, risk: f64, reward_ratio: f64) -> f64 {
    match outcome {
        TradeOutcome::Win => risk * reward_ratio,
        TradeOutcome::Loss => -risk,
        TradeOutcome::Submitted => 0.0,
    }
}

/// Position size from monetary risk and the stop distance, floored at the
/// broker's 0.01 minimum lot and rounded to 2dp.
pub fn lot_size(risk: f64, stop_loss_pips: u32) -> f64 {
    let lots = risk / (stop_loss_pips as f64 * PIP_VALUE);
    (lots.max(0.01) * 100.0).round() / 100.0
}

// ─── Build Order ──────────────────────────────────────────────────────────────

pub fn build_order(
    symbol: &str,
    signal: &Signal,
    entry_price: f64,
    stop_loss_pips: u32,
    take_profit_pips: u32,
    volume: f64,
) -> OrderRequest {
    let (action, sl, tp) = match signal.direction {
        Direction::Buy => (
            "BUY",
            entry_price - stop_loss_pips as f64 * PIP,
            entry_price + take_profit_pips as f64 * PIP,
        ),
        Direction::Sell => (
            "SELL",
            entry_price + stop_loss_pips as f64 * PIP,
            entry_price - take_profit_pips as f64 * PIP,
        ),
    };

    OrderRequest {
        symbol: symbol.to_string(),
        action,
        volume,
        price: entry_price,
        sl,
        tp,
        time_in_force: "GTC",
        comment: format!("daybreak_{action}"),
        magic: 100234,
    }
}

// ─── Execute ──────────────────────────────────────────────────────────────────

/// Execute a signal under the configured mode. Demo always settles and
/// mutates session state exactly once; live mutates only after the broker
/// accepts, and a rejected order leaves state untouched.
pub async fn execute(signal: &Signal, state: &SharedState) -> Result<Trade, AppError> {
    let trade = match state.config.execution_mode {
        ExecutionMode::Demo => execute_demo(signal, state),
        ExecutionMode::Live => execute_live(signal, state).await?,
    };

    // ── Single mutation point, then notify ───────────────────────────────────
    let capital = {
        let mut session = state.session.write().await;
        session.apply_trade(&trade);
        session.capital
    };

    info!(
        direction = %trade.direction,
        outcome = ?trade.outcome,
        result = trade.result,
        capital,
        "💰 Trade applied"
    );

    let sent = state.notifier.notify(&format_trade(&trade, capital)).await;
    if !sent {
        warn!("Trade notification skipped");
    }

    state.broadcast(&BotEvent::TradeExecuted {
        trade: Box::new(trade.clone()),
        capital,
    });

    Ok(trade)
}

/// Demo draw: Bernoulli outcome scaled by confidence.
fn execute_demo(signal: &Signal, state: &SharedState) -> Trade {
    let p = win_probability(signal.confidence);
    let won = rand::thread_rng().gen_bool(p);
    let outcome = if won { TradeOutcome::Win } else { TradeOutcome::Loss };
    let result = settle(
        outcome,
        state.config.risk_per_trade,
        state.config.reward_ratio(),
    );

    info!(
        direction = %signal.direction,
        confidence = signal.confidence,
        win_probability = p,
        "🎲 Demo draw"
    );

    Trade::new(signal.direction, signal.price, result, outcome)
}

/// Live order-send through the broker bridge.
async fn execute_live(signal: &Signal, state: &SharedState) -> Result<Trade, AppError> {
    let config = &state.config;
    let base_url = config
        .bridge_url
        .as_deref()
        .ok_or_else(|| AppError::ExecutionError("BRIDGE_URL not configured".into()))?;

    // BUY pays the ask, SELL receives the bid; fall back to the signal's mid
    // when no full tick is available.
    let entry_price = {
        let tick = state.last_tick.read().await;
        match (&*tick, signal.direction) {
            (Some(t), Direction::Buy) => t.ask,
            (Some(t), Direction::Sell) => t.bid,
            (None, _) => signal.price,
        }
    };

    let order = build_order(
        &config.symbol,
        signal,
        entry_price,
        config.stop_loss_pips,
        config.take_profit_pips,
        lot_size(config.risk_per_trade, config.stop_loss_pips),
    );

    let url = format!("{base_url}/order/send");
    info!(
        symbol = %order.symbol,
        action = %order.action,
        volume = order.volume,
        price = order.price,
        sl = order.sl,
        tp = order.tp,
        "🚀 Sending order to bridge"
    );

    let response = state
        .http_client
        .post(&url)
        .json(&order)
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await
        .map_err(|e| {
            error!(error = %e, "Bridge unreachable");
            AppError::ExecutionError(format!("bridge unreachable: {e}"))
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(http_status = %status, body = %body, "Bridge returned HTTP error");
        return Err(AppError::ExecutionError(format!("bridge HTTP {status}: {body}")));
    }

    let order_resp: OrderResponse = response.json().await.map_err(|e| {
        error!(error = %e, "Bridge response parse failed");
        AppError::ExecutionError(format!("bridge response parse error: {e}"))
    })?;

    if order_resp.retcode != 10009 {
        let msg = format!(
            "bridge rejected: retcode={} comment={}",
            order_resp.retcode,
            order_resp.comment.as_deref().unwrap_or("unknown")
        );
        warn!("{msg}");
        return Err(AppError::ExecutionError(msg));
    }

    info!(ticket = ?order_resp.order, "✅ Bridge accepted order");

    Ok(Trade::new(
        signal.direction,
        entry_price,
        0.0,
        TradeOutcome::Submitted,
    ))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
