//! Bollinger band breakout (level-triggered).

use super::Strategy;
use crate::domain::bar_table::BarTable;
use crate::domain::error::SignalbenchError;
use crate::domain::signal::{level_signals, Signal};

#[derive(Debug, Clone, Copy, Default)]
pub struct BollingerBreakout;

impl Strategy for BollingerBreakout {
    fn name(&self) -> &str {
        "Bollinger Breakout"
    }

    fn generate_signals(&self, table: &BarTable) -> Result<Vec<Signal>, SignalbenchError> {
        let upper = table.column("bb_upper")?;
        let lower = table.column("bb_lower")?;
        let closes = table.closes();

        Ok(level_signals(
            table.len(),
            |i| upper[i].is_some_and(|band| closes[i] > band),
            |i| lower[i].is_some_and(|band| closes[i] < band),
        ))
    }
}
