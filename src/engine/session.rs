//! # engine::session
//!
//! **Session Controller** — the timer-driven loop gating everything else.
//!
//! ## Cycle order (every `CYCLE_SECS`)
//! ```text
//! 1. running flag        → stopped? idle this cycle
//! 2. daily rollover      → UTC date advanced? reset daily counters
//! 3. trading window      → outside [start, end) or weekend? skip
//! 4. daily limits        → cap tripped? auto-stop + summary
//! 5. pull tick           → rolling window → indicators → detect
//! 6. actionable signal   → alert → confirmation delay → re-check → execute
//! 7. post-trade cooldown → extra sleep before the next cycle
//! ```
//!
//! The loop never dies: STOPPED just means cycles fall through at step 1,
//! and a start command flips the flag the loop reads next wakeup. Falling
//! behind skips cycles (`MissedTickBehavior::Skip`), it never queues them.

use std::collections::VecDeque;
use std::sync::atomic::Ordering;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::{detector, executor, indicators::IndicatorSnapshot};
use crate::events::BotEvent;
use crate::market::MarketFeed;
use crate::models::{SessionState, SessionSummary};
use crate::notifier::{
    format_limit_reached, format_session_started, format_session_stopped, format_signal_alert,
};
use crate::state::SharedState;

/// Rolling mid-price window length.
pub const WINDOW_CAP: usize = 100;

// ─── Daily Limits ─────────────────────────────────────────────────────────────

/// The gating check run before every cycle's trade path and re-run after the
/// confirmation delay. `Some(reason)` means the session must stop.
pub fn check_limits(session: &SessionState, config: &Config) -> Option<String> {
    if config.max_trades_per_day > 0 && session.trades_today >= config.max_trades_per_day {
        return Some(format!(
            "Daily trade cap reached: {}/{}",
            session.trades_today, config.max_trades_per_day
        ));
    }
    if config.max_daily_loss > 0.0 && session.loss_today >= config.max_daily_loss {
        return Some(format!(
            "Daily loss cap reached: ${:.2}/${:.2}",
            session.loss_today, config.max_daily_loss
        ));
    }
    None
}

// ─── Start / Stop Commands ────────────────────────────────────────────────────

/// STOPPED → RUNNING. Resets nothing: capital and counters persist across
/// restarts of the loop within one process.
pub async fn start(state: &SharedState) -> Result<(), &'static str> {
    {
        let mut session = state.session.write().await;
        if session.running {
            return Err("session already running");
        }
        session.running = true;
    }

    info!(symbol = %state.config.symbol, mode = %state.config.execution_mode, "▶️ Session started");
    state.broadcast(&BotEvent::SessionStarted);
    state
        .notifier
        .notify(&format_session_started(
            &state.config.execution_mode.to_string(),
            &state.config.symbol,
        ))
        .await;

    Ok(())
}

/// RUNNING → STOPPED with a summary notification. In-flight work completes;
/// the loop observes the flag at the top of its next cycle.
pub async fn stop(state: &SharedState) -> Result<SessionSummary, &'static str> {
    let summary = {
        let mut session = state.session.write().await;
        if !session.running {
            return Err("session not running");
        }
        session.running = false;
        session.summary()
    };

    info!(
        trades = summary.trades_today,
        net = summary.net_pnl,
        capital = summary.capital,
        "⏹️ Session stopped"
    );
    state.broadcast(&BotEvent::SessionStopped { summary });
    state.notifier.notify(&format_session_stopped(&summary)).await;

    Ok(summary)
}

// ─── Session Controller ───────────────────────────────────────────────────────

pub struct SessionController {
    state: SharedState,
    feed: MarketFeed,
    /// Mid prices, oldest first. Owned by the loop — single writer.
    window: VecDeque<f64>,
    prev_snapshot: Option<IndicatorSnapshot>,
}

impl SessionController {
    pub fn spawn(state: SharedState) -> tokio::task::JoinHandle<()> {
        let feed = MarketFeed::new(
            state.http_client.clone(),
            &state.config.symbol,
            state.config.feed_url.clone(),
        );
        let controller = Self {
            state,
            feed,
            window: VecDeque::with_capacity(WINDOW_CAP + 1),
            prev_snapshot: None,
        };
        tokio::spawn(controller.run())
    }

    async fn run(mut self) {
        let mut interval = tokio::time::interval(self.state.config.cycle_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval = ?self.state.config.cycle_interval,
            window = ?self.state.config.window,
            "Session controller loop started"
        );

        loop {
            interval.tick().await;
            self.cycle().await;
        }
    }

    async fn cycle(&mut self) {
        self.state.cycle_count.fetch_add(1, Ordering::Relaxed);

        // ── 1. Running? ──────────────────────────────────────────────────────
        if !self.state.session.read().await.running {
            return;
        }

        // ── 2. Daily rollover ────────────────────────────────────────────────
        let today = Utc::now().date_naive();
        {
            let mut session = self.state.session.write().await;
            if today > session.trading_day {
                session.roll_day(today);
                info!(%today, "📅 Daily counters reset");
            }
        }

        // ── 3. Trading window ────────────────────────────────────────────────
        if !self.state.config.window.contains(Utc::now()) {
            debug!("Outside trading window — cycle skipped");
            return;
        }

        // ── 4. Daily limits ──────────────────────────────────────────────────
        let tripped = {
            let session = self.state.session.read().await;
            check_limits(&session, &self.state.config)
        };
        if let Some(reason) = tripped {
            self.auto_stop(reason).await;
            return;
        }

        // ── 5. Pull tick → window → indicators ───────────────────────────────
        let Some(tick) = self.feed.next_tick().await else {
            warn!("No tick this cycle");
            return;
        };

        self.window.push_back(tick.mid());
        if self.window.len() > WINDOW_CAP {
            self.window.pop_front();
        }
        self.state.record_tick(tick).await;

        let Some(snapshot) = IndicatorSnapshot::compute(self.window.make_contiguous()) else {
            return;
        };
        debug!(
            price = snapshot.price,
            rsi = snapshot.rsi_or_neutral(),
            samples = self.window.len(),
            "Cycle snapshot"
        );

        // ── 6. Detect ────────────────────────────────────────────────────────
        let signal = detector::detect(&snapshot, self.prev_snapshot.as_ref());
        self.prev_snapshot = Some(snapshot);

        let Some(signal) = signal else {
            return;
        };

        info!(
            direction = %signal.direction,
            price = signal.price,
            rsi = signal.rsi,
            confidence = signal.confidence,
            "🔔 Signal detected"
        );
        self.state.notifier.notify(&format_signal_alert(&signal)).await;
        self.state.broadcast(&BotEvent::SignalDetected {
            signal: Box::new(signal.clone()),
        });

        // ── 7. Confirmation delay, then re-check the gate ────────────────────
        tokio::time::sleep(self.state.config.confirmation_delay).await;

        let tripped = {
            let session = self.state.session.read().await;
            check_limits(&session, &self.state.config)
        };
        if tripped.is_some() {
            debug!("Limit tripped during confirmation delay — signal dropped");
            return;
        }

        // ── 8. Execute + cooldown ────────────────────────────────────────────
        match executor::execute(&signal, &self.state).await {
            Ok(_) => {
                debug!(cooldown = ?self.state.config.cooldown, "Post-trade cooldown");
                tokio::time::sleep(self.state.config.cooldown).await;
            }
            Err(e) => {
                warn!(error = %e, "Trade execution failed — no state change");
            }
        }
    }

    /// A daily cap tripped: RUNNING → STOPPED with a limit notification.
    async fn auto_stop(&self, reason: String) {
        let summary = {
            let mut session = self.state.session.write().await;
            session.running = false;
            session.summary()
        };

        warn!(%reason, "⛔ Auto-stop");
        self.state.broadcast(&BotEvent::LimitReached {
            reason: reason.clone(),
        });
        self.state.broadcast(&BotEvent::SessionStopped { summary });
        self.state
            .notifier
            .notify(&format_limit_reached(&reason, &summary))
            .await;
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
