//! Historical bar source port trait.

use crate::domain::error::SignalbenchError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` between `start` and `end` inclusive, ordered by time.
    ///
    /// `interval` is the bar width as the source names it (`1d`, `1h`, `5m`).
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Vec<OhlcvBar>, SignalbenchError>;
}
