//! # models::session
//!
//! Defines [`SessionState`] — the singleton the Session Controller and Trade
//! Executor mutate and the Status Surface reads.
//!
//! Single-writer semantics: only the controller task (and the executor it
//! calls) writes; route handlers take read guards. Daily counters reset when
//! the UTC date rolls over, observed at the top of a cycle.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{Trade, TradeOutcome};

/// How many of today's operations are retained for reporting.
const OPERATIONS_CAP: usize = 50;

// ─── SessionState ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    /// RUNNING / STOPPED flag, observed by the loop at the top of each cycle.
    pub running: bool,
    pub capital: f64,
    pub trades_today: u32,
    pub profit_today: f64,
    pub loss_today: f64,
    pub consecutive_losses: u32,
    pub last_price: Option<f64>,
    pub last_update: Option<DateTime<Utc>>,
    /// Capped list of today's operations, newest last.
    pub operations: Vec<Trade>,
    /// UTC date the daily counters belong to.
    pub trading_day: NaiveDate,
}

impl SessionState {
    pub fn new(capital: f64) -> Self {
        Self {
            running: false,
            capital,
            trades_today: 0,
            profit_today: 0.0,
            loss_today: 0.0,
            consecutive_losses: 0,
            last_price: None,
            last_update: None,
            operations: Vec::new(),
            trading_day: Utc::now().date_naive(),
        }
    }

    /// Net P&L for the current trading day.
    pub fn net_today(&self) -> f64 {
        self.profit_today - self.loss_today
    }

    /// Apply one executed trade. The single mutation point: capital and the
    /// daily accumulators move together, exactly once per trade.
    pub fn apply_trade(&mut self, trade: &Trade) {
        self.capital += trade.result;
        self.trades_today += 1;
        match trade.outcome {
            TradeOutcome::Win => {
                self.profit_today += trade.result;
                self.consecutive_losses = 0;
            }
            TradeOutcome::Loss => {
                self.loss_today += -trade.result;
                self.consecutive_losses += 1;
            }
            TradeOutcome::Submitted => {}
        }
        self.last_update = Some(trade.executed_at);
        self.operations.push(trade.clone());
        if self.operations.len() > OPERATIONS_CAP {
            self.operations.remove(0);
        }
    }

    /// Reset the daily counters for a new UTC trading day. Capital persists.
    pub fn roll_day(&mut self, today: NaiveDate) {
        self.trades_today = 0;
        self.profit_today = 0.0;
        self.loss_today = 0.0;
        self.consecutive_losses = 0;
        self.operations.clear();
        self.trading_day = today;
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            trades_today: self.trades_today,
            net_pnl: self.net_today(),
            capital: self.capital,
        }
    }
}

// ─── SessionSummary ───────────────────────────────────────────────────────────

/// Emitted with every stop notification.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SessionSummary {
    pub trades_today: u32,
    pub net_pnl: f64,
    pub capital: f64,
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;

    fn win(risk: f64, ratio: f64) -> Trade {
        Trade::new(Direction::Buy, 1.0850, risk * ratio, TradeOutcome::Win)
    }

    fn loss(risk: f64) -> Trade {
        Trade::new(Direction::Sell, 1.0850, -risk, TradeOutcome::Loss)
    }

    #[test]
    fn apply_trade_moves_capital_by_exactly_result() {
        let mut state = SessionState::new(100.0);
        let before = state.capital;
        let trade = win(0.20, 2.0);
        state.apply_trade(&trade);
        assert!((state.capital - (before + trade.result)).abs() < 1e-9);
        assert_eq!(state.trades_today, 1);
    }

    #[test]
    fn win_and_loss_accumulate_separately() {
        let mut state = SessionState::new(100.0);
        state.apply_trade(&win(0.20, 2.0));
        state.apply_trade(&loss(0.20));
        assert!((state.profit_today - 0.40).abs() < 1e-9);
        assert!((state.loss_today - 0.20).abs() < 1e-9);
        assert!((state.net_today() - 0.20).abs() < 1e-9);
        assert_eq!(state.consecutive_losses, 1);
    }

    #[test]
    fn win_resets_consecutive_losses() {
        let mut state = SessionState::new(100.0);
        state.apply_trade(&loss(0.20));
        state.apply_trade(&loss(0.20));
        assert_eq!(state.consecutive_losses, 2);
        state.apply_trade(&win(0.20, 2.0));
        assert_eq!(state.consecutive_losses, 0);
    }

    #[test]
    fn five_forced_wins_scenario() {
        // capital=100.00, risk=0.20, ratio=2 → five WINs = 102.00
        let mut state = SessionState::new(100.0);
        for _ in 0..5 {
            state.apply_trade(&win(0.20, 2.0));
        }
        assert_eq!(state.trades_today, 5);
        assert!((state.capital - 102.00).abs() < 1e-9);
    }

    #[test]
    fn operations_list_is_capped() {
        let mut state = SessionState::new(100.0);
        for _ in 0..60 {
            state.apply_trade(&win(0.20, 2.0));
        }
        assert_eq!(state.operations.len(), 50);
    }

    #[test]
    fn roll_day_resets_counters_but_not_capital() {
        let mut state = SessionState::new(100.0);
        state.apply_trade(&win(0.20, 2.0));
        let capital = state.capital;
        let next_day = state.trading_day.succ_opt().unwrap();
        state.roll_day(next_day);
        assert_eq!(state.trades_today, 0);
        assert!((state.capital - capital).abs() < f64::EPSILON);
        assert!(state.operations.is_empty());
        assert_eq!(state.trading_day, next_day);
    }
}
