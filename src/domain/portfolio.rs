//! Portfolio valuation: holdings joined with live quotes.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::error::TraderError;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::quote_port::QuotePort;

/// Where a position's price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Live,
    /// Live lookup failed; price is the user's most recent trade in the symbol.
    LastTrade,
    /// No price at all; the position is valued at zero.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionValuation {
    pub symbol: String,
    pub name: Option<String>,
    pub shares: i64,
    pub price: Option<Decimal>,
    pub value: Decimal,
    pub source: PriceSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioView {
    pub cash: Decimal,
    pub positions: Vec<PositionValuation>,
    pub holdings_value: Decimal,
    pub net_worth: Decimal,
}

impl PortfolioView {
    /// True when any position is priced from something other than a live quote.
    pub fn has_stale_prices(&self) -> bool {
        self.positions.iter().any(|p| p.source != PriceSource::Live)
    }
}

/// Value every holding of `user_id`. A failed lookup for one symbol falls
/// back to the last trade price instead of failing the view.
pub async fn build_portfolio(
    ledger: &dyn LedgerPort,
    quotes: &dyn QuotePort,
    user_id: i64,
) -> Result<PortfolioView, TraderError> {
    let user = ledger
        .find_user(user_id)?
        .ok_or_else(|| TraderError::authentication("unknown user"))?;

    let mut positions = Vec::new();
    for holding in ledger.holdings(user_id)? {
        let live = match quotes.lookup(&holding.symbol).await {
            Ok(Some(quote)) if quote.price > Decimal::ZERO => Some(quote),
            Ok(Some(quote)) => {
                warn!(symbol = %holding.symbol, price = %quote.price, "quote has non-positive price");
                None
            }
            Ok(None) => {
                warn!(symbol = %holding.symbol, "no live quote for held symbol");
                None
            }
            Err(e) => {
                warn!(symbol = %holding.symbol, error = %e, "quote lookup failed");
                None
            }
        };

        let (name, price, source) = match live {
            Some(quote) => (Some(quote.name), Some(quote.price), PriceSource::Live),
            None => match ledger.last_trade_price(user_id, &holding.symbol)? {
                Some(price) => (None, Some(price), PriceSource::LastTrade),
                None => (None, None, PriceSource::Unavailable),
            },
        };

        let value = price
            .map(|p| p * Decimal::from(holding.shares))
            .unwrap_or(Decimal::ZERO);
        debug!(symbol = %holding.symbol, shares = holding.shares, %value, ?source, "valued position");

        positions.push(PositionValuation {
            symbol: holding.symbol,
            name,
            shares: holding.shares,
            price,
            value,
            source,
        });
    }

    let holdings_value: Decimal = positions.iter().map(|p| p.value).sum();
    Ok(PortfolioView {
        cash: user.cash,
        net_worth: user.cash + holdings_value,
        holdings_value,
        positions,
    })
}
