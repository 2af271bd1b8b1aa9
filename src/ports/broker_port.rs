//! Brokerage account port trait.

use crate::domain::cost::Side;
use crate::domain::error::SignalbenchError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Account {
    pub cash: f64,
    pub equity: f64,
    pub buying_power: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerPosition {
    pub symbol: String,
    pub quantity: u64,
    pub avg_entry_price: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub symbol: String,
    pub quantity: u64,
    pub side: Side,
    pub fill_price: Option<f64>,
}

pub trait BrokerPort {
    fn get_account(&self) -> Result<Account, SignalbenchError>;

    /// `Ok(None)` when nothing is held.
    fn get_position(&self, symbol: &str) -> Result<Option<BrokerPosition>, SignalbenchError>;

    /// Market order. A refusal is `Err(OrderRejected)`.
    fn submit_order(
        &self,
        symbol: &str,
        quantity: u64,
        side: Side,
    ) -> Result<Order, SignalbenchError>;

    /// Latest close seen by the trading loop. Simulated brokers fill market
    /// orders at this price; real brokers ignore it.
    fn observe_price(&self, _symbol: &str, _price: f64) {}
}
