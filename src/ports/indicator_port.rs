//! Indicator provider port trait.

use crate::domain::bar_table::BarTable;
use crate::domain::error::SignalbenchError;

pub trait IndicatorPort: Send + Sync {
    /// Add indicator columns. May drop leading rows that lack history for the
    /// longest lookback; never drops or reorders any other row.
    fn add_indicators(&self, table: &BarTable) -> Result<BarTable, SignalbenchError>;

    /// Add `returns` (simple) and `log_returns` columns; both undefined on row 0.
    fn add_returns(&self, table: &BarTable) -> Result<BarTable, SignalbenchError>;
}
