//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
pub mod indicators;
pub mod paper_broker;
pub mod resilient_data_adapter;
pub mod synthetic;
