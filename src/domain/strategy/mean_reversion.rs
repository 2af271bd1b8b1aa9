//! RSI mean reversion: buy oversold, sell overbought (level-triggered).

use super::Strategy;
use crate::domain::bar_table::BarTable;
use crate::domain::error::SignalbenchError;
use crate::domain::signal::{level_signals, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct MeanReversionParams {
    pub rsi_period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        MeanReversionParams {
            rsi_period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeanReversion {
    params: MeanReversionParams,
}

impl MeanReversion {
    pub fn new(params: MeanReversionParams) -> Self {
        Self { params }
    }

    fn rsi_column(&self) -> String {
        format!("rsi_{}", self.params.rsi_period)
    }
}

impl Strategy for MeanReversion {
    fn name(&self) -> &str {
        "Mean Reversion"
    }

    fn generate_signals(&self, table: &BarTable) -> Result<Vec<Signal>, SignalbenchError> {
        let rsi = table.column(&self.rsi_column())?;
        let MeanReversionParams {
            oversold,
            overbought,
            ..
        } = self.params;

        Ok(level_signals(
            table.len(),
            |i| rsi[i].is_some_and(|v| v < oversold),
            |i| rsi[i].is_some_and(|v| v > overbought),
        ))
    }
}
