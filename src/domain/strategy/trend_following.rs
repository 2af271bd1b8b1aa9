//! Fast/slow moving average trend filter (level-triggered).

use super::Strategy;
use crate::domain::bar_table::BarTable;
use crate::domain::error::SignalbenchError;
use crate::domain::signal::{level_signals, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct TrendFollowingParams {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl Default for TrendFollowingParams {
    fn default() -> Self {
        TrendFollowingParams {
            fast_period: 50,
            slow_period: 200,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrendFollowing {
    params: TrendFollowingParams,
}

impl TrendFollowing {
    pub fn new(params: TrendFollowingParams) -> Self {
        Self { params }
    }
}

impl Strategy for TrendFollowing {
    fn name(&self) -> &str {
        "Trend Following"
    }

    fn generate_signals(&self, table: &BarTable) -> Result<Vec<Signal>, SignalbenchError> {
        let fast = table.column(&format!("sma_{}", self.params.fast_period))?;
        let slow = table.column(&format!("sma_{}", self.params.slow_period))?;

        let compare = |i: usize| match (fast[i], slow[i]) {
            (Some(f), Some(s)) => f.partial_cmp(&s),
            _ => None,
        };

        Ok(level_signals(
            table.len(),
            |i| compare(i) == Some(std::cmp::Ordering::Greater),
            |i| compare(i) == Some(std::cmp::Ordering::Less),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::{some, table};

    #[test]
    fn fast_above_slow_buys_every_bar() {
        let t = table(&[1.0; 4])
            .with_column("sma_50", some(&[10.0, 11.0, 9.0, 10.0]))
            .unwrap()
            .with_column("sma_200", some(&[9.0, 9.0, 10.0, 10.0]))
            .unwrap();
        let signals = TrendFollowing::default().generate_signals(&t).unwrap();
        assert_eq!(
            signals,
            vec![Signal::Buy, Signal::Buy, Signal::Sell, Signal::Hold]
        );
    }

    #[test]
    fn custom_periods_read_matching_columns() {
        let params = TrendFollowingParams {
            fast_period: 20,
            slow_period: 50,
        };
        let strategy = TrendFollowing::new(params);
        let t = table(&[1.0; 2])
            .with_column("sma_20", some(&[1.0, 2.0]))
            .unwrap();
        let err = strategy.generate_signals(&t).unwrap_err();
        assert!(matches!(err, SignalbenchError::MissingIndicator { column } if column == "sma_50"));
    }
}
