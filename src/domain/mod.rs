//! Core domain types and logic.

pub mod backtest;
pub mod bar_table;
pub mod comparison;
pub mod config_validation;
pub mod cost;
pub mod error;
pub mod live;
pub mod metrics;
pub mod ohlcv;
pub mod position;
pub mod settings;
pub mod signal;
pub mod strategy;
