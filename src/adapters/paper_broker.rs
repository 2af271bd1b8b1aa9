//! In-memory paper trading broker.
//!
//! Market orders fill immediately at the last price passed to
//! [`BrokerPort::observe_price`]. Orders are rejected when no price has been
//! seen, when cash does not cover a buy, or when a sell exceeds the holding.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::domain::cost::Side;
use crate::domain::error::SignalbenchError;
use crate::ports::broker_port::{Account, BrokerPort, BrokerPosition, Order};

#[derive(Debug, Clone, Copy)]
struct Holding {
    quantity: u64,
    avg_entry_price: f64,
}

#[derive(Debug, Default)]
struct Book {
    cash: f64,
    holdings: HashMap<String, Holding>,
    prices: HashMap<String, f64>,
    next_order_id: u64,
}

impl Book {
    fn market_value(&self, symbol: &str, holding: &Holding) -> f64 {
        let price = self
            .prices
            .get(symbol)
            .copied()
            .unwrap_or(holding.avg_entry_price);
        price * holding.quantity as f64
    }
}

#[derive(Debug)]
pub struct PaperBroker {
    book: Mutex<Book>,
}

impl PaperBroker {
    pub fn new(cash: f64) -> Self {
        Self {
            book: Mutex::new(Book {
                cash,
                ..Book::default()
            }),
        }
    }

    fn reject(symbol: &str, reason: String) -> SignalbenchError {
        SignalbenchError::OrderRejected {
            symbol: symbol.to_string(),
            reason,
        }
    }
}

impl BrokerPort for PaperBroker {
    fn get_account(&self) -> Result<Account, SignalbenchError> {
        let book = self.book.lock().unwrap_or_else(PoisonError::into_inner);
        let holdings_value: f64 = book
            .holdings
            .iter()
            .map(|(symbol, h)| book.market_value(symbol, h))
            .sum();
        Ok(Account {
            cash: book.cash,
            equity: book.cash + holdings_value,
            buying_power: book.cash,
        })
    }

    fn get_position(&self, symbol: &str) -> Result<Option<BrokerPosition>, SignalbenchError> {
        let book = self.book.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(book.holdings.get(symbol).map(|h| {
            let market_value = book.market_value(symbol, h);
            BrokerPosition {
                symbol: symbol.to_string(),
                quantity: h.quantity,
                avg_entry_price: h.avg_entry_price,
                market_value,
                unrealized_pnl: market_value - h.avg_entry_price * h.quantity as f64,
            }
        }))
    }

    fn submit_order(
        &self,
        symbol: &str,
        quantity: u64,
        side: Side,
    ) -> Result<Order, SignalbenchError> {
        if quantity == 0 {
            return Err(Self::reject(symbol, "quantity must be positive".into()));
        }

        let mut book = self.book.lock().unwrap_or_else(PoisonError::into_inner);
        let price = book
            .prices
            .get(symbol)
            .copied()
            .ok_or_else(|| Self::reject(symbol, "no price observed".into()))?;
        let value = price * quantity as f64;

        match side {
            Side::Buy => {
                if value > book.cash {
                    return Err(Self::reject(
                        symbol,
                        format!("insufficient cash: need {value:.2}, have {:.2}", book.cash),
                    ));
                }
                book.cash -= value;
                let holding = book.holdings.entry(symbol.to_string()).or_insert(Holding {
                    quantity: 0,
                    avg_entry_price: price,
                });
                let total_cost =
                    holding.avg_entry_price * holding.quantity as f64 + value;
                holding.quantity += quantity;
                holding.avg_entry_price = total_cost / holding.quantity as f64;
            }
            Side::Sell => {
                let held = book.holdings.get(symbol).map_or(0, |h| h.quantity);
                if quantity > held {
                    return Err(Self::reject(
                        symbol,
                        format!("cannot sell {quantity}, holding {held}"),
                    ));
                }
                book.cash += value;
                if quantity == held {
                    book.holdings.remove(symbol);
                } else if let Some(h) = book.holdings.get_mut(symbol) {
                    h.quantity -= quantity;
                }
            }
        }

        book.next_order_id += 1;
        let order = Order {
            id: format!("paper-{}", book.next_order_id),
            symbol: symbol.to_string(),
            quantity,
            side,
            fill_price: Some(price),
        };
        tracing::debug!(symbol, %side, quantity, price, cash = book.cash, "paper fill");
        Ok(order)
    }

    fn observe_price(&self, symbol: &str, price: f64) {
        if price > 0.0 && price.is_finite() {
            self.book
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .prices
                .insert(symbol.to_string(), price);
        }
    }
}
