//! # routes::webhook
//!
//! Inbound signal ingestion: an external detector (typically a charting
//! platform alert) POSTs its conditions here and we forward a formatted
//! alert — after the session-time gate and only when every condition holds.

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::AppError;
use crate::models::Direction;
use crate::notifier::format_webhook_alert;
use crate::state::SharedState;

// ─── Payload ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WebhookAlert {
    /// "buy" or "sell".
    pub side: String,
    pub price: f64,
    pub vwap: f64,
    /// "up" or "down"; must agree with `side`.
    pub ema9_slope: String,
    pub pullback: bool,
    pub rejection: bool,
    pub break_structure: bool,
}

// ─── Validation ───────────────────────────────────────────────────────────────

/// All boolean conditions must hold and the EMA slope must agree with the
/// side. Returns the parsed direction.
pub fn validate_alert(alert: &WebhookAlert) -> Result<Direction, &'static str> {
    let side = match alert.side.to_lowercase().as_str() {
        "buy" => Direction::Buy,
        "sell" => Direction::Sell,
        _ => return Err("side must be 'buy' or 'sell'"),
    };

    if !(alert.pullback && alert.rejection && alert.break_structure) {
        return Err("conditions not confirmed");
    }

    let expected_slope = match side {
        Direction::Buy => "up",
        Direction::Sell => "down",
    };
    if alert.ema9_slope.to_lowercase() != expected_slope {
        return Err("ema9 slope inconsistent with side");
    }

    Ok(side)
}

// ─── POST /webhook ────────────────────────────────────────────────────────────

pub async fn handle_webhook(
    State(state): State<SharedState>,
    Json(alert): Json<WebhookAlert>,
) -> Result<impl IntoResponse, AppError> {
    // Session-time gate comes first: out-of-window alerts are ignored, not
    // rejected, and send nothing.
    if !state.config.window.contains(Utc::now()) {
        info!(side = %alert.side, "Webhook outside session window — ignored");
        return Ok(Json(json!({
            "success": false,
            "message": "ignored: outside session window",
        })));
    }

    let side = validate_alert(&alert).map_err(|reason| AppError::BadRequest(reason.into()))?;

    info!(%side, price = alert.price, vwap = alert.vwap, "📣 Webhook alert accepted");
    state
        .notifier
        .notify(&format_webhook_alert(side, alert.price, alert.vwap))
        .await;

    Ok(Json(json!({
        "success": true,
        "message": format!("{side} alert forwarded"),
    })))
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_alert() -> WebhookAlert {
        WebhookAlert {
            side: "buy".into(),
            price: 1.0810,
            vwap: 1.0800,
            ema9_slope: "up".into(),
            pullback: true,
            rejection: true,
            break_structure: true,
        }
    }

    #[test]
    fn valid_buy_alert_passes() {
        assert_eq!(validate_alert(&make_alert()).unwrap(), Direction::Buy);
    }

    #[test]
    fn valid_sell_alert_passes() {
        let mut alert = make_alert();
        alert.side = "sell".into();
        alert.ema9_slope = "down".into();
        assert_eq!(validate_alert(&alert).unwrap(), Direction::Sell);
    }

    #[test]
    fn any_false_condition_rejects() {
        for i in 0..3 {
            let mut alert = make_alert();
            match i {
                0 => alert.pullback = false,
                1 => alert.rejection = false,
                _ => alert.break_structure = false,
            }
            assert_eq!(validate_alert(&alert), Err("conditions not confirmed"));
        }
    }

    #[test]
    fn slope_must_agree_with_side() {
        let mut alert = make_alert();
        alert.ema9_slope = "down".into();
        assert_eq!(validate_alert(&alert), Err("ema9 slope inconsistent with side"));
    }

    #[test]
    fn unknown_side_rejects() {
        let mut alert = make_alert();
        alert.side = "hold".into();
        assert!(validate_alert(&alert).is_err());
    }
}
