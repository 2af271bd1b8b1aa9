//! Live execution loop.
//!
//! Drives a strategy against a broker on a fixed polling interval:
//!
//! ```text
//! Idle → Polling → Evaluating → Ordering → Sleeping → Polling …
//!                                                   ↘ Stopped
//! ```
//!
//! A cycle outside the trading window goes straight to `Sleeping`. Errors for
//! one symbol are logged and the cycle moves on to the next symbol.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};

use super::bar_table::BarTable;
use super::cost::Side;
use super::error::SignalbenchError;
use super::signal::Signal;
use super::strategy::Strategy;
use crate::ports::broker_port::{Account, BrokerPort, BrokerPosition};
use crate::ports::data_port::DataPort;
use crate::ports::indicator_port::IndicatorPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveState {
    Idle,
    Polling,
    Evaluating,
    Ordering,
    Sleeping,
    Stopped,
}

/// Cancellation handle shared between the loop and whoever stops it.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for up to `timeout`. Returns `true` if stopped.
    pub fn wait(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Weekdays, optionally narrowed to `[open, close)` each day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradingWindow {
    pub open: Option<NaiveTime>,
    pub close: Option<NaiveTime>,
}

impl TradingWindow {
    pub fn is_open(&self, at: NaiveDateTime) -> bool {
        if matches!(at.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let time = at.time();
        let after_open = self.open.is_none_or(|open| time >= open);
        let before_close = self.close.is_none_or(|close| time < close);
        after_open && before_close
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveConfig {
    pub symbols: Vec<String>,
    pub interval: Duration,
    /// Share of available cash committed to one entry.
    pub cash_fraction: f64,
    pub lookback_days: i64,
    /// Bar interval requested from the data port.
    pub bar_interval: String,
    pub max_duration: Option<Duration>,
    pub window: TradingWindow,
}

impl Default for LiveConfig {
    fn default() -> Self {
        LiveConfig {
            symbols: Vec::new(),
            interval: Duration::from_secs(300),
            cash_fraction: 0.2,
            lookback_days: 180,
            bar_interval: "1d".into(),
            max_duration: None,
            window: TradingWindow::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy { quantity: u64 },
    Sell { quantity: u64 },
    Hold,
}

/// Map the latest signal and held position to an order.
pub fn decide(
    signal: Signal,
    position: Option<&BrokerPosition>,
    cash: f64,
    price: f64,
    cash_fraction: f64,
) -> Decision {
    let held = position.map_or(0, |p| p.quantity);
    match signal {
        Signal::Buy if held == 0 => {
            if !(price > 0.0) || !price.is_finite() {
                return Decision::Hold;
            }
            let quantity = (cash * cash_fraction / price).floor();
            if quantity >= 1.0 {
                Decision::Buy {
                    quantity: quantity as u64,
                }
            } else {
                Decision::Hold
            }
        }
        Signal::Sell if held > 0 => Decision::Sell { quantity: held },
        _ => Decision::Hold,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveSummary {
    pub cycles: usize,
    pub orders_submitted: usize,
    pub orders_failed: usize,
    /// `None` when the broker could not be reached on exit.
    pub final_account: Option<Account>,
}

#[derive(Debug, Default, Clone, Copy)]
struct CycleOutcome {
    submitted: usize,
    failed: usize,
}

pub struct LiveTrader<'a> {
    strategy: &'a dyn Strategy,
    data: &'a dyn DataPort,
    indicators: &'a dyn IndicatorPort,
    broker: &'a dyn BrokerPort,
    clock: &'a dyn Clock,
    config: LiveConfig,
    state: LiveState,
}

impl<'a> LiveTrader<'a> {
    pub fn new(
        strategy: &'a dyn Strategy,
        data: &'a dyn DataPort,
        indicators: &'a dyn IndicatorPort,
        broker: &'a dyn BrokerPort,
        clock: &'a dyn Clock,
        config: LiveConfig,
    ) -> Self {
        LiveTrader {
            strategy,
            data,
            indicators,
            broker,
            clock,
            config,
            state: LiveState::Idle,
        }
    }

    pub fn state(&self) -> LiveState {
        self.state
    }

    pub fn config(&self) -> &LiveConfig {
        &self.config
    }

    fn transition(&mut self, next: LiveState) {
        if self.state != next {
            tracing::trace!(from = ?self.state, to = ?next, "live state");
            self.state = next;
        }
    }

    /// Run until `stop` fires or `max_duration` has elapsed after a cycle.
    pub fn run(&mut self, stop: &StopSignal) -> LiveSummary {
        let started = self.clock.now();
        let budget = self
            .config
            .max_duration
            .and_then(|d| chrono::Duration::from_std(d).ok());

        tracing::info!(
            strategy = self.strategy.name(),
            symbols = ?self.config.symbols,
            interval_secs = self.config.interval.as_secs(),
            "starting live trading"
        );

        let mut cycles = 0;
        let mut orders_submitted = 0;
        let mut orders_failed = 0;

        while !stop.is_stopped() {
            let outcome = self.run_cycle();
            cycles += 1;
            orders_submitted += outcome.submitted;
            orders_failed += outcome.failed;

            if let Some(budget) = budget {
                if self.clock.now() - started >= budget {
                    tracing::info!(cycles, "live trading duration reached");
                    break;
                }
            }

            self.transition(LiveState::Sleeping);
            if stop.wait(self.config.interval) {
                break;
            }
        }

        self.transition(LiveState::Stopped);

        let final_account = match self.broker.get_account() {
            Ok(account) => {
                tracing::info!(
                    cash = account.cash,
                    equity = account.equity,
                    buying_power = account.buying_power,
                    cycles,
                    orders_submitted,
                    orders_failed,
                    "final account"
                );
                Some(account)
            }
            Err(e) => {
                tracing::error!(error = %e, "could not read final account");
                None
            }
        };

        LiveSummary {
            cycles,
            orders_submitted,
            orders_failed,
            final_account,
        }
    }

    /// One polling pass over every configured symbol.
    fn run_cycle(&mut self) -> CycleOutcome {
        let now = self.clock.now();
        if !self.config.window.is_open(now) {
            tracing::debug!(%now, "outside trading window");
            return CycleOutcome::default();
        }

        self.transition(LiveState::Polling);
        let account = match self.broker.get_account() {
            Ok(account) => account,
            Err(e) => {
                tracing::error!(error = %e, "could not read account, skipping cycle");
                return CycleOutcome::default();
            }
        };

        let mut outcome = CycleOutcome::default();
        let symbols = self.config.symbols.clone();
        for symbol in &symbols {
            match self.trade_symbol(symbol, &account, now) {
                Ok(Some(true)) => outcome.submitted += 1,
                Ok(Some(false)) => outcome.failed += 1,
                Ok(None) => {}
                Err(e) => tracing::error!(symbol = %symbol, error = %e, "error processing symbol"),
            }
        }
        outcome
    }

    /// `Some(true)` on a submitted order, `Some(false)` on a rejected one,
    /// `None` when no order was due.
    fn trade_symbol(
        &mut self,
        symbol: &str,
        account: &Account,
        now: NaiveDateTime,
    ) -> Result<Option<bool>, SignalbenchError> {
        self.transition(LiveState::Polling);
        let end = now.date();
        let start = end - chrono::Duration::days(self.config.lookback_days);
        let bars = self
            .data
            .fetch(symbol, start, end, &self.config.bar_interval)?;
        if bars.is_empty() {
            return Err(SignalbenchError::NoData {
                symbol: symbol.to_string(),
            });
        }

        self.transition(LiveState::Evaluating);
        let table = BarTable::new(bars)?;
        let prepared = self.strategy.prepare_data(&table, self.indicators)?;
        let signals = self.strategy.generate_signals(&prepared)?;
        let (Some(&signal), Some(last)) = (signals.last(), prepared.last()) else {
            return Err(SignalbenchError::InsufficientData {
                symbol: symbol.to_string(),
                bars: prepared.len(),
                minimum: 1,
            });
        };
        let price = last.close;
        self.broker.observe_price(symbol, price);

        let position = self.broker.get_position(symbol)?;
        tracing::info!(symbol, %signal, price, held = position.as_ref().map_or(0, |p| p.quantity), "signal");

        let (quantity, side) = match decide(
            signal,
            position.as_ref(),
            account.cash,
            price,
            self.config.cash_fraction,
        ) {
            Decision::Buy { quantity } => (quantity, Side::Buy),
            Decision::Sell { quantity } => (quantity, Side::Sell),
            Decision::Hold => return Ok(None),
        };

        self.transition(LiveState::Ordering);
        match self.broker.submit_order(symbol, quantity, side) {
            Ok(order) => {
                tracing::info!(symbol, %side, quantity, order_id = %order.id, "order submitted");
                Ok(Some(true))
            }
            Err(e) => {
                tracing::warn!(symbol, %side, quantity, error = %e, "order failed");
                Ok(Some(false))
            }
        }
    }
}
