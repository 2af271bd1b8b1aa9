#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use signalbench::domain::bar_table::BarTable;
use signalbench::domain::cost::Side;
use signalbench::domain::error::SignalbenchError;
use signalbench::domain::live::Clock;
pub use signalbench::domain::ohlcv::OhlcvBar;
use signalbench::ports::broker_port::{Account, BrokerPort, BrokerPosition, Order};
use signalbench::ports::data_port::DataPort;
use signalbench::ports::indicator_port::IndicatorPort;
use std::collections::HashMap;
use std::sync::Mutex;
use std::process::ExitCode;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
        _interval: &str,
    ) -> Result<Vec<OhlcvBar>, SignalbenchError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SignalbenchError::DataFetch {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

/// Adds preset indicator columns, matched to the input by row count from
/// the end, so the last value of each column lines up with the last bar.
pub struct PresetIndicators {
    pub columns: Vec<(String, Vec<Option<f64>>)>,
}

impl PresetIndicators {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: &str, values: &[f64]) -> Self {
        self.columns
            .push((name.to_string(), values.iter().copied().map(Some).collect()));
        self
    }
}

impl IndicatorPort for PresetIndicators {
    fn add_indicators(&self, table: &BarTable) -> Result<BarTable, SignalbenchError> {
        let mut out = table.clone();
        for (name, values) in &self.columns {
            let n = table.len();
            let column: Vec<Option<f64>> = if values.len() >= n {
                values[values.len() - n..].to_vec()
            } else {
                let mut padded = vec![None; n - values.len()];
                padded.extend_from_slice(values);
                padded
            };
            out = out.with_column(name.clone(), column)?;
        }
        Ok(out)
    }

    fn add_returns(&self, table: &BarTable) -> Result<BarTable, SignalbenchError> {
        Ok(table.clone())
    }
}

#[derive(Debug, Default)]
pub struct MockBrokerState {
    pub cash: f64,
    pub positions: HashMap<String, u64>,
    pub orders: Vec<(String, u64, Side)>,
    pub prices: HashMap<String, f64>,
    pub reject_symbols: Vec<String>,
    pub account_calls: usize,
}

/// Records orders and fills them at the last observed price.
pub struct MockBroker {
    pub state: Mutex<MockBrokerState>,
}

impl MockBroker {
    pub fn new(cash: f64) -> Self {
        Self {
            state: Mutex::new(MockBrokerState {
                cash,
                ..Default::default()
            }),
        }
    }

    pub fn with_position(self, symbol: &str, quantity: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .positions
            .insert(symbol.to_string(), quantity);
        self
    }

    pub fn rejecting(self, symbol: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .reject_symbols
            .push(symbol.to_string());
        self
    }

    pub fn orders(&self) -> Vec<(String, u64, Side)> {
        self.state.lock().unwrap().orders.clone()
    }
}

impl BrokerPort for MockBroker {
    fn get_account(&self) -> Result<Account, SignalbenchError> {
        let mut state = self.state.lock().unwrap();
        state.account_calls += 1;
        Ok(Account {
            cash: state.cash,
            equity: state.cash,
            buying_power: state.cash,
        })
    }

    fn get_position(&self, symbol: &str) -> Result<Option<BrokerPosition>, SignalbenchError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .positions
            .get(symbol)
            .filter(|&&q| q > 0)
            .map(|&quantity| BrokerPosition {
                symbol: symbol.to_string(),
                quantity,
                avg_entry_price: 0.0,
                market_value: 0.0,
                unrealized_pnl: 0.0,
            }))
    }

    fn submit_order(
        &self,
        symbol: &str,
        quantity: u64,
        side: Side,
    ) -> Result<Order, SignalbenchError> {
        let mut state = self.state.lock().unwrap();
        if state.reject_symbols.iter().any(|s| s == symbol) {
            return Err(SignalbenchError::OrderRejected {
                symbol: symbol.to_string(),
                reason: "rejected by mock".into(),
            });
        }
        let price = state.prices.get(symbol).copied().unwrap_or(0.0);
        let held = state.positions.entry(symbol.to_string()).or_insert(0);
        match side {
            Side::Buy => *held += quantity,
            Side::Sell => *held -= quantity,
        }
        match side {
            Side::Buy => state.cash -= price * quantity as f64,
            Side::Sell => state.cash += price * quantity as f64,
        }
        state.orders.push((symbol.to_string(), quantity, side));
        Ok(Order {
            id: format!("mock-{}", state.orders.len()),
            symbol: symbol.to_string(),
            quantity,
            side,
            fill_price: Some(price),
        })
    }

    fn observe_price(&self, symbol: &str, price: f64) {
        self.state
            .lock()
            .unwrap()
            .prices
            .insert(symbol.to_string(), price);
    }
}

/// Starts at `start` and moves forward `step` on every reading.
pub struct SteppingClock {
    now: Mutex<NaiveDateTime>,
    step: chrono::Duration,
}

impl SteppingClock {
    pub fn new(start: NaiveDateTime, step: chrono::Duration) -> Self {
        Self {
            now: Mutex::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> NaiveDateTime {
        let mut now = self.now.lock().unwrap();
        let current = *now;
        *now = current + self.step;
        current
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

pub fn make_bars(symbol: &str, start: NaiveDate, closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            symbol: symbol.to_string(),
            timestamp: (start + chrono::Duration::days(i as i64))
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        })
        .collect()
}

pub fn make_table(closes: &[f64]) -> BarTable {
    BarTable::new(make_bars("TEST", date(2024, 1, 1), closes)).unwrap()
}

pub fn is_success(code: ExitCode) -> bool {
    format!("{:?}", code) == format!("{:?}", ExitCode::SUCCESS)
}
