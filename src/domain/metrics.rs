//! Performance metrics.

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub sharpe_ratio: f64,
    /// Fraction, always <= 0.
    pub max_drawdown: f64,
    pub win_rate: f64,
    /// Bars with a non-zero strategy return.
    pub total_trades: usize,
}

/// Reduce an equity curve and its per-bar strategy returns to summary statistics.
pub fn summarize(
    equity: &[f64],
    strategy_returns: &[Option<f64>],
    initial_capital: f64,
) -> PerformanceSummary {
    let total_return = match equity.last() {
        Some(last) if initial_capital > 0.0 => last / initial_capital - 1.0,
        _ => 0.0,
    };

    let returns: Vec<f64> = strategy_returns.iter().flatten().copied().collect();

    let winning = returns.iter().filter(|&&r| r > 0.0).count();
    let total_trades = returns.iter().filter(|&&r| r != 0.0).count();
    let win_rate = if total_trades > 0 {
        winning as f64 / total_trades as f64
    } else {
        0.0
    };

    PerformanceSummary {
        total_return,
        sharpe_ratio: sharpe_ratio(&returns),
        max_drawdown: max_drawdown(equity),
        win_rate,
        total_trades,
    }
}

/// √252 · mean / sample stdev. Zero when undefined.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 && stddev.is_finite() {
        TRADING_DAYS_PER_YEAR.sqrt() * mean / stddev
    } else {
        0.0
    }
}

/// Worst peak-to-trough decline as a non-positive fraction.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let Some(&first) = equity.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &value in equity {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = (value - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
