//! Strategy contract and the built-in rule families.
//!
//! | Strategy | Trigger | Buy | Sell |
//! |---|---|---|---|
//! | Mean Reversion | level | RSI < oversold | RSI > overbought |
//! | Momentum | edge | RSI crosses above threshold | RSI crosses below threshold |
//! | MACD | edge | MACD crosses above signal line | MACD crosses below signal line |
//! | Bollinger Breakout | level | close > upper band | close < lower band |
//! | Trend Following | level | fast SMA > slow SMA | fast SMA < slow SMA |
//!
//! Edge-triggered strategies fire only on the bar where the condition starts
//! to hold; level-triggered strategies fire on every bar where it holds.

pub mod bollinger_breakout;
pub mod macd_cross;
pub mod mean_reversion;
pub mod momentum;
pub mod trend_following;

pub use bollinger_breakout::BollingerBreakout;
pub use macd_cross::MacdCross;
pub use mean_reversion::{MeanReversion, MeanReversionParams};
pub use momentum::{Momentum, MomentumParams};
pub use trend_following::{TrendFollowing, TrendFollowingParams};

use super::bar_table::BarTable;
use super::error::SignalbenchError;
use super::signal::Signal;
use crate::ports::indicator_port::IndicatorPort;

pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// One signal per row of `table`. A required column that is absent is a
    /// `MissingIndicator` error.
    fn generate_signals(&self, table: &BarTable) -> Result<Vec<Signal>, SignalbenchError>;

    /// Raw bars → bars with indicator and return columns. Leaves `table` untouched.
    fn prepare_data(
        &self,
        table: &BarTable,
        indicators: &dyn IndicatorPort,
    ) -> Result<BarTable, SignalbenchError> {
        let with_indicators = indicators.add_indicators(table)?;
        indicators.add_returns(&with_indicators)
    }
}

/// Per-family parameter overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyParams {
    pub mean_reversion: MeanReversionParams,
    pub momentum: MomentumParams,
    pub trend_following: TrendFollowingParams,
}

pub const STRATEGY_KEYS: [&str; 5] = [
    "mean_reversion",
    "trend_following",
    "momentum",
    "macd",
    "bollinger",
];

/// Build a strategy by key (`mean_reversion`, `momentum`, `macd`,
/// `bollinger`, `trend_following`). Spaces and hyphens count as underscores.
pub fn build_strategy(
    name: &str,
    params: &StrategyParams,
) -> Result<Box<dyn Strategy>, SignalbenchError> {
    let key = name.trim().to_lowercase().replace([' ', '-'], "_");
    let strategy: Box<dyn Strategy> = match key.as_str() {
        "mean_reversion" => Box::new(MeanReversion::new(params.mean_reversion.clone())),
        "momentum" => Box::new(Momentum::new(params.momentum.clone())),
        "macd" | "macd_cross" => Box::new(MacdCross),
        "bollinger" | "bollinger_breakout" => Box::new(BollingerBreakout),
        "trend_following" => Box::new(TrendFollowing::new(params.trend_following.clone())),
        _ => {
            return Err(SignalbenchError::UnknownStrategy {
                name: name.to_string(),
            })
        }
    };
    Ok(strategy)
}

/// Every built-in strategy, in comparison order.
pub fn all_strategies(params: &StrategyParams) -> Vec<Box<dyn Strategy>> {
    STRATEGY_KEYS
        .iter()
        .filter_map(|key| build_strategy(key, params).ok())
        .collect()
}
