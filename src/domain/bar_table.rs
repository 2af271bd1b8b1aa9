//! Time-ordered bar table with named indicator columns.
//!
//! Indicator values are `Option<f64>`: `None` marks a row where the indicator
//! is undefined (warm-up, first-row returns). The table never infers or
//! backfills a column; asking for one that is absent is a configuration error.

use std::collections::BTreeMap;
use std::ops::Range;

use super::error::SignalbenchError;
use super::ohlcv::OhlcvBar;

pub type Column = Vec<Option<f64>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarTable {
    bars: Vec<OhlcvBar>,
    columns: BTreeMap<String, Column>,
}

impl BarTable {
    /// Build a table from bars, rejecting duplicate or decreasing timestamps.
    pub fn new(bars: Vec<OhlcvBar>) -> Result<Self, SignalbenchError> {
        if let Some(index) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(SignalbenchError::UnorderedBars { index: index + 1 });
        }
        Ok(Self {
            bars,
            columns: BTreeMap::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Result<&[Option<f64>], SignalbenchError> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SignalbenchError::MissingIndicator {
                column: name.to_string(),
            })
    }

    /// Return a new table with `name` set to `values`, replacing any existing column.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Column,
    ) -> Result<Self, SignalbenchError> {
        let name = name.into();
        if values.len() != self.bars.len() {
            return Err(SignalbenchError::ColumnLength {
                column: name,
                expected: self.bars.len(),
                actual: values.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(self)
    }

    pub fn drop_leading(&self, n: usize) -> BarTable {
        self.rows(n.min(self.len())..self.len())
    }

    pub fn tail(&self, n: usize) -> BarTable {
        self.rows(self.len().saturating_sub(n)..self.len())
    }

    /// Contiguous train / validation / test split.
    ///
    /// `train_end = floor(n * train_pct)`,
    /// `val_end = floor(n * (train_pct + validation_pct))`.
    pub fn split_train_test(
        &self,
        train_pct: f64,
        validation_pct: f64,
    ) -> (BarTable, BarTable, BarTable) {
        let n = self.len();
        let train_end = ((n as f64 * train_pct).floor() as usize).min(n);
        let val_end = ((n as f64 * (train_pct + validation_pct)).floor() as usize).clamp(train_end, n);

        tracing::debug!(
            train = train_end,
            validation = val_end - train_end,
            test = n - val_end,
            "split bar table"
        );

        (
            self.rows(0..train_end),
            self.rows(train_end..val_end),
            self.rows(val_end..n),
        )
    }

    fn rows(&self, range: Range<usize>) -> BarTable {
        BarTable {
            bars: self.bars[range.clone()].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), values[range.clone()].to_vec()))
                .collect(),
        }
    }
}
