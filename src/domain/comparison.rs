//! Run several strategies over one bar table and rank them by Sharpe ratio.
//!
//! Strategies run in parallel; each reads the shared table and writes only
//! its own result. A failing strategy is logged and left out of the ranking.

use rayon::prelude::*;

use super::backtest::{run_backtest, BacktestConfig, SimulationResult};
use super::bar_table::BarTable;
use super::metrics::PerformanceSummary;
use super::strategy::Strategy;
use crate::ports::indicator_port::IndicatorPort;

#[derive(Debug, Clone)]
pub struct RankedResult {
    pub rank: usize,
    pub strategy_name: String,
    pub summary: PerformanceSummary,
    pub simulation: SimulationResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ComparisonReport {
    /// Sorted by descending Sharpe ratio.
    pub ranked: Vec<RankedResult>,
    pub failures: Vec<StrategyFailure>,
}

impl ComparisonReport {
    pub fn best(&self) -> Option<&RankedResult> {
        self.ranked.first()
    }
}

pub fn compare_strategies(
    bars: &BarTable,
    strategies: &[Box<dyn Strategy>],
    indicators: &dyn IndicatorPort,
    config: &BacktestConfig,
) -> ComparisonReport {
    let outcomes: Vec<_> = strategies
        .par_iter()
        .map(|strategy| {
            tracing::info!(strategy = strategy.name(), "testing strategy");
            (
                strategy.name().to_string(),
                run_backtest(bars, strategy.as_ref(), indicators, config),
            )
        })
        .collect();

    let mut report = ComparisonReport::default();
    let mut completed = Vec::new();

    for (strategy_name, outcome) in outcomes {
        match outcome {
            Ok(simulation) => {
                let summary = simulation.summary();
                tracing::info!(
                    strategy = %strategy_name,
                    total_return = summary.total_return,
                    sharpe = summary.sharpe_ratio,
                    "strategy completed"
                );
                completed.push((strategy_name, summary, simulation));
            }
            Err(e) => {
                tracing::warn!(strategy = %strategy_name, error = %e, "strategy failed");
                report.failures.push(StrategyFailure {
                    strategy_name,
                    reason: e.to_string(),
                });
            }
        }
    }

    completed.sort_by(|a, b| b.1.sharpe_ratio.total_cmp(&a.1.sharpe_ratio));

    report.ranked = completed
        .into_iter()
        .enumerate()
        .map(|(i, (strategy_name, summary, simulation))| RankedResult {
            rank: i + 1,
            strategy_name,
            summary,
            simulation,
        })
        .collect();

    report
}
