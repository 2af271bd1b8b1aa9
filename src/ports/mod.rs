//! Port traits: the seams between the domain and the outside world.

pub mod broker_port;
pub mod config_port;
pub mod data_port;
pub mod indicator_port;
pub mod report_port;
