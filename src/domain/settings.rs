//! Typed settings resolved from the config port, validated up front.

use rust_decimal::Decimal;
use std::time::Duration;

use super::error::TraderError;
use super::money::parse_amount;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_STARTING_CASH: &str = "10000.00";
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_SESSION_LIFETIME_SECS: i64 = 86400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteProviderKind {
    Yahoo,
    Static,
}

/// Cash credited to every new account.
pub fn starting_cash(config: &dyn ConfigPort) -> Result<Decimal, TraderError> {
    let raw = config
        .get_string("trading", "starting_cash")
        .unwrap_or_else(|| DEFAULT_STARTING_CASH.to_string());
    let cash = parse_amount(&raw).map_err(|e| TraderError::ConfigInvalid {
        section: "trading".into(),
        key: "starting_cash".into(),
        reason: e.to_string(),
    })?;
    if cash.is_sign_negative() {
        return Err(TraderError::ConfigInvalid {
            section: "trading".into(),
            key: "starting_cash".into(),
            reason: "starting_cash must be non-negative".into(),
        });
    }
    Ok(cash)
}

pub fn quote_provider(config: &dyn ConfigPort) -> Result<QuoteProviderKind, TraderError> {
    let raw = config
        .get_string("quotes", "provider")
        .unwrap_or_else(|| "yahoo".to_string());
    match raw.trim().to_lowercase().as_str() {
        "yahoo" => Ok(QuoteProviderKind::Yahoo),
        "static" => Ok(QuoteProviderKind::Static),
        other => Err(TraderError::ConfigInvalid {
            section: "quotes".into(),
            key: "provider".into(),
            reason: format!("unknown provider {other:?}, expected yahoo or static"),
        }),
    }
}

pub fn quote_timeout(config: &dyn ConfigPort) -> Result<Duration, TraderError> {
    let secs = config.get_int("quotes", "timeout_secs", 10);
    if secs <= 0 {
        return Err(TraderError::ConfigInvalid {
            section: "quotes".into(),
            key: "timeout_secs".into(),
            reason: "timeout_secs must be positive".into(),
        });
    }
    Ok(Duration::from_secs(secs as u64))
}

pub fn database_path(config: &dyn ConfigPort) -> Result<String, TraderError> {
    config
        .get_string("database", "path")
        .ok_or_else(|| TraderError::ConfigMissing {
            section: "database".into(),
            key: "path".into(),
        })
}

fn validate_pool_size(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let size = config.get_int("database", "pool_size", 4);
    if size < 1 {
        return Err(TraderError::ConfigInvalid {
            section: "database".into(),
            key: "pool_size".into(),
            reason: "pool_size must be at least 1".into(),
        });
    }
    Ok(())
}

/// Seconds of inactivity before a session expires.
pub fn session_lifetime(config: &dyn ConfigPort) -> Result<i64, TraderError> {
    let secs = config.get_int("auth", "session_lifetime", DEFAULT_SESSION_LIFETIME_SECS);
    if secs < 1 {
        return Err(TraderError::ConfigInvalid {
            section: "auth".into(),
            key: "session_lifetime".into(),
            reason: "session_lifetime must be at least 1 second".into(),
        });
    }
    Ok(secs)
}

/// Check everything `serve` needs before any resource is opened.
pub fn validate_server_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    database_path(config)?;
    validate_pool_size(config)?;
    starting_cash(config)?;
    quote_provider(config)?;
    quote_timeout(config)?;
    session_lifetime(config)?;
    Ok(())
}
