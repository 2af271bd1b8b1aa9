//! MACD line / signal line crossover (edge-triggered).

use super::Strategy;
use crate::domain::bar_table::BarTable;
use crate::domain::error::SignalbenchError;
use crate::domain::signal::{crosses_above, crosses_below, Signal};

#[derive(Debug, Clone, Copy, Default)]
pub struct MacdCross;

impl Strategy for MacdCross {
    fn name(&self) -> &str {
        "MACD"
    }

    fn generate_signals(&self, table: &BarTable) -> Result<Vec<Signal>, SignalbenchError> {
        let macd = table.column("macd")?;
        let signal_line = table.column("macd_signal")?;

        Ok((0..table.len())
            .map(|i| {
                if crosses_above(macd, signal_line, i) {
                    Signal::Buy
                } else if crosses_below(macd, signal_line, i) {
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            })
            .collect())
    }
}
