//! Discrete trading signals and the comparison helpers strategies share.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    /// +1 / -1 / 0
    pub fn value(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::Hold => 0,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

/// Level-triggered: Buy where `buy(i)` holds, Sell where `sell(i)` holds, Hold elsewhere.
/// Sell wins if both hold on the same row.
pub(crate) fn level_signals(
    len: usize,
    buy: impl Fn(usize) -> bool,
    sell: impl Fn(usize) -> bool,
) -> Vec<Signal> {
    (0..len)
        .map(|i| {
            if sell(i) {
                Signal::Sell
            } else if buy(i) {
                Signal::Buy
            } else {
                Signal::Hold
            }
        })
        .collect()
}

/// `a` crosses above `b` at row `i`: a[i] > b[i] and a[i-1] <= b[i-1].
/// Row 0 never crosses; undefined values never compare true.
pub(crate) fn crosses_above(a: &[Option<f64>], b: &[Option<f64>], i: usize) -> bool {
    if i == 0 {
        return false;
    }
    match (a[i], b[i], a[i - 1], b[i - 1]) {
        (Some(a_now), Some(b_now), Some(a_prev), Some(b_prev)) => a_now > b_now && a_prev <= b_prev,
        _ => false,
    }
}

/// `a` crosses below `b` at row `i`: a[i] < b[i] and a[i-1] >= b[i-1].
pub(crate) fn crosses_below(a: &[Option<f64>], b: &[Option<f64>], i: usize) -> bool {
    if i == 0 {
        return false;
    }
    match (a[i], b[i], a[i - 1], b[i - 1]) {
        (Some(a_now), Some(b_now), Some(a_prev), Some(b_prev)) => a_now < b_now && a_prev >= b_prev,
        _ => false,
    }
}
