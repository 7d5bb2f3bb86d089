//! Order input parsing.

use super::error::TraderError;

/// Normalise a ticker: trimmed and upper-cased. Blank input is rejected.
pub fn normalize_symbol(raw: &str) -> Result<String, TraderError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(TraderError::validation("must provide symbol"));
    }
    Ok(symbol)
}

/// A validated buy or sell request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub symbol: String,
    pub shares: i64,
}

impl OrderRequest {
    pub fn new(symbol: &str, shares: i64) -> Result<Self, TraderError> {
        let symbol = normalize_symbol(symbol)?;
        if shares <= 0 {
            return Err(TraderError::validation(
                "shares must be a positive integer",
            ));
        }
        Ok(Self { symbol, shares })
    }

    /// Parse form input. Shares must be plain decimal digits: no sign,
    /// no fraction, no exponent.
    pub fn parse(symbol: &str, shares: &str) -> Result<Self, TraderError> {
        let shares = shares.trim();
        if shares.is_empty() || !shares.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TraderError::validation(
                "shares must be a positive integer",
            ));
        }
        let count: i64 = shares
            .parse()
            .map_err(|_| TraderError::validation("share count is too large"))?;
        Self::new(symbol, count)
    }
}
