//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod sqlite_adapter;
pub mod static_quote_adapter;
pub mod yahoo_quote_adapter;
#[cfg(feature = "web")]
pub mod web;
