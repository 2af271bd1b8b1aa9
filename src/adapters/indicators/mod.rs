//! Standard technical indicator set.
//!
//! | Column | Definition |
//! |---|---|
//! | `sma_20`, `sma_50`, `sma_200` | simple moving averages of close |
//! | `ema_12`, `ema_26` | exponential moving averages of close |
//! | `rsi_14` | Wilder RSI |
//! | `macd`, `macd_signal`, `macd_hist` | MACD(12, 26, 9) |
//! | `bb_upper`, `bb_middle`, `bb_lower`, `bb_width` | Bollinger(20, 2σ) |
//! | `atr_14` | Wilder average true range |
//!
//! Extra SMA and RSI periods can be requested so configured strategies find
//! their columns. Rows before every indicator is defined are dropped.

pub mod math;

use std::collections::BTreeSet;

use crate::domain::bar_table::BarTable;
use crate::domain::error::SignalbenchError;
use crate::domain::strategy::StrategyParams;
use crate::ports::indicator_port::IndicatorPort;

const BASE_SMA_PERIODS: [usize; 3] = [20, 50, 200];
const BASE_RSI_PERIOD: usize = 14;

#[derive(Debug, Clone)]
pub struct StandardIndicators {
    sma_periods: BTreeSet<usize>,
    rsi_periods: BTreeSet<usize>,
}

impl Default for StandardIndicators {
    fn default() -> Self {
        StandardIndicators {
            sma_periods: BASE_SMA_PERIODS.into_iter().collect(),
            rsi_periods: [BASE_RSI_PERIOD].into_iter().collect(),
        }
    }
}

impl StandardIndicators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard set plus whatever periods `params` refers to.
    pub fn for_strategies(params: &StrategyParams) -> Self {
        Self::new()
            .with_sma_period(params.trend_following.fast_period)
            .with_sma_period(params.trend_following.slow_period)
            .with_rsi_period(params.mean_reversion.rsi_period)
            .with_rsi_period(params.momentum.rsi_period)
    }

    pub fn with_sma_period(mut self, period: usize) -> Self {
        if period > 0 {
            self.sma_periods.insert(period);
        }
        self
    }

    pub fn with_rsi_period(mut self, period: usize) -> Self {
        if period > 0 {
            self.rsi_periods.insert(period);
        }
        self
    }

    /// Rows needed before the first fully defined row.
    pub fn warmup(&self) -> usize {
        let sma = self.sma_periods.iter().max().map_or(0, |p| p - 1);
        let rsi = self.rsi_periods.iter().max().copied().unwrap_or(0);
        // macd signal line, bollinger, atr
        let fixed = [26 - 1 + 9 - 1, 20 - 1, 14 - 1];
        fixed.into_iter().fold(sma.max(rsi), usize::max)
    }
}

impl IndicatorPort for StandardIndicators {
    fn add_indicators(&self, table: &BarTable) -> Result<BarTable, SignalbenchError> {
        if table.is_empty() {
            return Ok(table.clone());
        }

        let closes = table.closes();
        let mut out = table.clone();

        for &p in &self.sma_periods {
            out = out.with_column(format!("sma_{p}"), math::sma(&closes, p))?;
        }
        out = out
            .with_column("ema_12", math::ema(&closes, 12))?
            .with_column("ema_26", math::ema(&closes, 26))?;
        for &p in &self.rsi_periods {
            out = out.with_column(format!("rsi_{p}"), math::rsi(&closes, p))?;
        }

        let macd = math::macd(&closes, 12, 26, 9);
        let bands = math::bollinger(&closes, 20, 2.0);
        out = out
            .with_column("macd", macd.line)?
            .with_column("macd_signal", macd.signal)?
            .with_column("macd_hist", macd.histogram)?
            .with_column("bb_upper", bands.upper)?
            .with_column("bb_middle", bands.middle)?
            .with_column("bb_lower", bands.lower)?
            .with_column("bb_width", bands.width)?
            .with_column("atr_14", math::atr(table.bars(), 14))?;

        let first_complete = (0..out.len()).find(|&row| {
            out.column_names()
                .all(|name| out.column(name).is_ok_and(|c| c[row].is_some()))
        });

        match first_complete {
            Some(row) => {
                tracing::debug!(
                    rows = table.len(),
                    dropped = row,
                    "indicators computed"
                );
                Ok(out.drop_leading(row))
            }
            None => {
                let symbol = table
                    .last()
                    .map(|b| b.symbol.clone())
                    .unwrap_or_default();
                Err(SignalbenchError::InsufficientData {
                    symbol,
                    bars: table.len(),
                    minimum: self.warmup() + 1,
                })
            }
        }
    }

    fn add_returns(&self, table: &BarTable) -> Result<BarTable, SignalbenchError> {
        let closes = table.closes();
        let simple: Vec<Option<f64>> = (0..closes.len())
            .map(|i| (i > 0).then(|| closes[i] / closes[i - 1] - 1.0))
            .collect();
        let log: Vec<Option<f64>> = (0..closes.len())
            .map(|i| (i > 0).then(|| (closes[i] / closes[i - 1]).ln()))
            .collect();
        table
            .clone()
            .with_column("returns", simple)?
            .with_column("log_returns", log)
    }
}
