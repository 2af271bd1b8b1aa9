//! Backtest simulator.
//!
//! Replays one strategy over one bar table:
//! prepare → signals → positions → per-bar strategy returns → equity curve.
//!
//! The return earned on bar `i` uses the position held at the close of bar
//! `i - 1`, so a signal can never profit from the move on its own bar.
//! Transaction costs are not netted into the equity curve; see
//! [`SimulationResult::cost_report`].

use super::bar_table::BarTable;
use super::cost::CostModel;
use super::error::SignalbenchError;
use super::metrics::{summarize, PerformanceSummary};
use super::position::{closed_trades, to_positions, ClosedTrade, Position};
use super::signal::Signal;
use super::strategy::Strategy;
use crate::ports::indicator_port::IndicatorPort;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub strategy_name: String,
    pub initial_capital: f64,
    /// Prepared table the signals were generated from.
    pub table: BarTable,
    pub signals: Vec<Signal>,
    pub positions: Vec<Position>,
    /// `None` on the first row.
    pub strategy_returns: Vec<Option<f64>>,
    pub equity: Vec<f64>,
}

/// Roundtrip costs for one reconstructed trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeCost {
    pub trade: ClosedTrade,
    pub quantity: f64,
    pub roundtrip_cost: f64,
}

impl SimulationResult {
    pub fn summary(&self) -> PerformanceSummary {
        summarize(&self.equity, &self.strategy_returns, self.initial_capital)
    }

    pub fn final_equity(&self) -> f64 {
        self.equity.last().copied().unwrap_or(self.initial_capital)
    }

    pub fn closed_trades(&self) -> Vec<ClosedTrade> {
        closed_trades(self.table.bars(), &self.positions)
    }

    /// Per-trade roundtrip costs under `model`, sized as
    /// `floor(equity_at_entry / entry_price)` shares (at least one).
    ///
    /// This is a report alongside the equity curve, not a deduction from it.
    pub fn cost_report(&self, model: &CostModel) -> Result<Vec<TradeCost>, SignalbenchError> {
        self.closed_trades()
            .into_iter()
            .map(|trade| {
                let equity_at_entry = self.equity[trade.entry_index];
                let quantity = (equity_at_entry / trade.entry_price).floor().max(1.0);
                let roundtrip_cost =
                    model.roundtrip_cost(trade.entry_price, trade.exit_price, quantity)?;
                Ok(TradeCost {
                    trade,
                    quantity,
                    roundtrip_cost,
                })
            })
            .collect()
    }
}

/// Run `strategy` over raw `bars`.
///
/// Strategy and indicator errors propagate unchanged to the caller.
pub fn run_backtest(
    bars: &BarTable,
    strategy: &dyn Strategy,
    indicators: &dyn IndicatorPort,
    config: &BacktestConfig,
) -> Result<SimulationResult, SignalbenchError> {
    if !(config.initial_capital > 0.0) {
        return Err(SignalbenchError::ConfigInvalid {
            section: "backtest".into(),
            key: "initial_capital".into(),
            reason: "initial_capital must be positive".into(),
        });
    }

    let prepared = strategy.prepare_data(bars, indicators)?;
    let signals = strategy.generate_signals(&prepared)?;
    let positions = to_positions(&signals);

    let closes = prepared.closes();
    let strategy_returns = strategy_returns(&closes, &positions);
    let equity = equity_curve(&strategy_returns, config.initial_capital);

    tracing::debug!(
        strategy = strategy.name(),
        bars = prepared.len(),
        final_equity = equity.last().copied().unwrap_or(config.initial_capital),
        "simulation complete"
    );

    Ok(SimulationResult {
        strategy_name: strategy.name().to_string(),
        initial_capital: config.initial_capital,
        table: prepared,
        signals,
        positions,
        strategy_returns,
        equity,
    })
}

/// `position[i-1] * (close[i] / close[i-1] - 1)`; undefined on row 0.
pub fn strategy_returns(closes: &[f64], positions: &[Position]) -> Vec<Option<f64>> {
    let mut returns = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i == 0 {
            returns.push(None);
            continue;
        }
        let bar_return = closes[i] / closes[i - 1] - 1.0;
        returns.push(Some(positions[i - 1].value() * bar_return));
    }
    returns
}

/// Compounded equity; undefined returns leave equity unchanged.
pub fn equity_curve(strategy_returns: &[Option<f64>], initial_capital: f64) -> Vec<f64> {
    strategy_returns
        .iter()
        .scan(initial_capital, |equity, r| {
            *equity *= 1.0 + r.unwrap_or(0.0);
            Some(*equity)
        })
        .collect()
}
