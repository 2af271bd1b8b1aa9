//! Held position per bar and the trades implied by position changes.

use chrono::NaiveDateTime;

use super::ohlcv::OhlcvBar;
use super::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
    Long,
    #[default]
    Flat,
}

impl Position {
    pub fn value(self) -> f64 {
        match self {
            Position::Long => 1.0,
            Position::Flat => 0.0,
        }
    }

    pub fn is_long(self) -> bool {
        self == Position::Long
    }
}

/// Carry signals forward into positions.
///
/// Buy opens, Sell closes, Hold keeps whatever the previous bar held. The
/// position at bar `i` is a function of `signals[..=i]` only.
pub fn to_positions(signals: &[Signal]) -> Vec<Position> {
    signals
        .iter()
        .scan(Position::Flat, |current, signal| {
            match signal {
                Signal::Buy => *current = Position::Long,
                Signal::Sell => *current = Position::Flat,
                Signal::Hold => {}
            }
            Some(*current)
        })
        .collect()
}

/// A round trip reconstructed from the position sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Still long on the final bar; closed there for reporting.
    pub open_at_end: bool,
}

impl ClosedTrade {
    pub fn return_pct(&self) -> f64 {
        (self.exit_price / self.entry_price - 1.0) * 100.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}

/// Flat→Long opens at that bar's close; Long→Flat closes at that bar's close.
pub fn closed_trades(bars: &[OhlcvBar], positions: &[Position]) -> Vec<ClosedTrade> {
    let mut trades = Vec::new();
    let mut entry: Option<usize> = None;
    let mut previous = Position::Flat;

    let rows = positions.len().min(bars.len());

    for (i, &position) in positions[..rows].iter().enumerate() {
        match (previous, position) {
            (Position::Flat, Position::Long) => entry = Some(i),
            (Position::Long, Position::Flat) => {
                if let Some(start) = entry.take() {
                    trades.push(make_trade(bars, start, i, false));
                }
            }
            _ => {}
        }
        previous = position;
    }

    if let Some(start) = entry {
        trades.push(make_trade(bars, start, rows - 1, true));
    }

    trades
}

fn make_trade(bars: &[OhlcvBar], entry: usize, exit: usize, open_at_end: bool) -> ClosedTrade {
    ClosedTrade {
        entry_index: entry,
        exit_index: exit,
        entry_time: bars[entry].timestamp,
        exit_time: bars[exit].timestamp,
        entry_price: bars[entry].close,
        exit_price: bars[exit].close,
        open_at_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                symbol: "TEST".into(),
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    fn signal_strategy() -> impl Strategy<Value = Signal> {
        prop_oneof![Just(Signal::Buy), Just(Signal::Sell), Just(Signal::Hold)]
    }

    #[test]
    fn starts_flat_without_signals() {
        let positions = to_positions(&[Signal::Hold, Signal::Hold]);
        assert_eq!(positions, vec![Position::Flat, Position::Flat]);
    }

    #[test]
    fn buy_then_holds_stays_long() {
        let mut signals = vec![Signal::Buy];
        signals.extend(std::iter::repeat(Signal::Hold).take(500));
        let positions = to_positions(&signals);
        assert!(positions.iter().all(|p| p.is_long()));
    }

    #[test]
    fn sell_goes_flat_not_short() {
        let positions = to_positions(&[Signal::Buy, Signal::Sell, Signal::Hold]);
        assert_eq!(
            positions,
            vec![Position::Long, Position::Flat, Position::Flat]
        );
    }

    #[test]
    fn empty_signals_give_empty_positions() {
        assert!(to_positions(&[]).is_empty());
    }

    #[test]
    fn closed_trades_from_round_trip() {
        let bars = make_bars(&[100.0, 101.0, 99.0, 98.0, 103.0]);
        let positions = vec![
            Position::Flat,
            Position::Long,
            Position::Long,
            Position::Flat,
            Position::Flat,
        ];
        let trades = closed_trades(&bars, &positions);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].entry_index, 1);
        assert_eq!(trades[0].exit_index, 3);
        assert_eq!(trades[0].bars_held(), 2);
        assert!((trades[0].return_pct() - (98.0 / 101.0 - 1.0) * 100.0).abs() < 1e-12);
        assert!(!trades[0].open_at_end);
    }

    #[test]
    fn open_position_is_closed_on_last_bar() {
        let bars = make_bars(&[100.0, 101.0, 99.0]);
        let positions = vec![Position::Flat, Position::Flat, Position::Long];
        let trades = closed_trades(&bars, &positions);
        assert_eq!(trades.len(), 1);
        assert!(trades[0].open_at_end);
        assert_eq!(trades[0].entry_index, 2);
        assert_eq!(trades[0].exit_index, 2);
    }

    proptest! {
        #[test]
        fn positions_depend_only_on_prefix(
            signals in proptest::collection::vec(signal_strategy(), 1..200),
            cut in 0usize..200,
        ) {
            let cut = cut % signals.len();
            let full = to_positions(&signals);
            let prefix = to_positions(&signals[..=cut]);
            prop_assert_eq!(&full[..=cut], &prefix[..]);
        }

        #[test]
        fn positions_match_last_non_hold_signal(
            signals in proptest::collection::vec(signal_strategy(), 0..200),
        ) {
            let positions = to_positions(&signals);
            prop_assert_eq!(positions.len(), signals.len());
            for (i, position) in positions.iter().enumerate() {
                let last = signals[..=i].iter().rev().find(|s| **s != Signal::Hold);
                let expected = match last {
                    Some(Signal::Buy) => Position::Long,
                    _ => Position::Flat,
                };
                prop_assert_eq!(*position, expected);
                prop_assert!(position.value() == 0.0 || position.value() == 1.0);
            }
        }
    }
}
