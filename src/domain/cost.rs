//! Transaction cost model.
//!
//! All rates are percentages: `spread_pct = 0.01` means 0.01% (1 bp).

use std::fmt;
use std::str::FromStr;

use super::error::SignalbenchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(format!("unknown side `{other}` (expected buy or sell)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub commission_pct: f64,
    pub commission_min: f64,
    pub spread_pct: f64,
    pub slippage_pct: f64,
    /// Accepted from configuration; not applied.
    pub market_impact: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            commission_pct: 0.0,
            commission_min: 0.0,
            spread_pct: 0.01,
            slippage_pct: 0.05,
            market_impact: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub gross_value: f64,
    pub commission: f64,
    pub spread_cost: f64,
    pub slippage_cost: f64,
    pub total_cost: f64,
    pub effective_price: f64,
}

impl CostModel {
    /// Cost of one fill.
    ///
    /// commission = max(gross * commission_pct / 100, commission_min);
    /// effective price = (gross ± total) / quantity, plus for buys, minus for sells.
    pub fn entry_cost(
        &self,
        price: f64,
        quantity: f64,
        side: Side,
    ) -> Result<CostBreakdown, SignalbenchError> {
        if !(quantity > 0.0) || !quantity.is_finite() {
            return Err(SignalbenchError::InvalidQuantity { quantity });
        }

        let gross_value = price * quantity;
        let commission = (gross_value * self.commission_pct / 100.0).max(self.commission_min);
        let spread_cost = gross_value * self.spread_pct / 100.0;
        let slippage_cost = gross_value * self.slippage_pct / 100.0;
        let total_cost = commission + spread_cost + slippage_cost;

        let effective_price = match side {
            Side::Buy => (gross_value + total_cost) / quantity,
            Side::Sell => (gross_value - total_cost) / quantity,
        };

        Ok(CostBreakdown {
            gross_value,
            commission,
            spread_cost,
            slippage_cost,
            total_cost,
            effective_price,
        })
    }

    /// Buy at `entry_price`, later sell the same quantity at `exit_price`.
    pub fn roundtrip_cost(
        &self,
        entry_price: f64,
        exit_price: f64,
        quantity: f64,
    ) -> Result<f64, SignalbenchError> {
        let entry = self.entry_cost(entry_price, quantity, Side::Buy)?;
        let exit = self.entry_cost(exit_price, quantity, Side::Sell)?;
        Ok(entry.total_cost + exit.total_cost)
    }
}
