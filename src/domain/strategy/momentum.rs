//! RSI momentum: trade the oscillator crossing a threshold (edge-triggered).
//!
//! Reads `rsi_{period}`; when that column is absent it falls back to the
//! standard `rsi_14`. No other column has a fallback.

use super::Strategy;
use crate::domain::bar_table::BarTable;
use crate::domain::error::SignalbenchError;
use crate::domain::signal::{crosses_above, crosses_below, Signal};

const FALLBACK_RSI_COLUMN: &str = "rsi_14";

#[derive(Debug, Clone, PartialEq)]
pub struct MomentumParams {
    pub rsi_period: usize,
    pub threshold: f64,
}

impl Default for MomentumParams {
    fn default() -> Self {
        MomentumParams {
            rsi_period: 14,
            threshold: 50.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Momentum {
    params: MomentumParams,
}

impl Momentum {
    pub fn new(params: MomentumParams) -> Self {
        Self { params }
    }

    fn rsi_column(&self, table: &BarTable) -> String {
        let configured = format!("rsi_{}", self.params.rsi_period);
        if table.has_column(&configured) {
            configured
        } else {
            tracing::debug!(
                configured = %configured,
                fallback = FALLBACK_RSI_COLUMN,
                "momentum falling back to default RSI column"
            );
            FALLBACK_RSI_COLUMN.to_string()
        }
    }
}

impl Strategy for Momentum {
    fn name(&self) -> &str {
        "Momentum"
    }

    fn generate_signals(&self, table: &BarTable) -> Result<Vec<Signal>, SignalbenchError> {
        let rsi = table.column(&self.rsi_column(table))?;
        let threshold = vec![Some(self.params.threshold); table.len()];

        Ok((0..table.len())
            .map(|i| {
                if crosses_above(rsi, &threshold, i) {
                    Signal::Buy
                } else if crosses_below(rsi, &threshold, i) {
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            })
            .collect())
    }
}
