//! Trading engine: turns validated orders into ledger fills.
//!
//! Order of checks for a buy: input, quote, funds. For a sell: input, held
//! shares, quote. The ledger repeats the funds/shares check inside its own
//! transaction, so a concurrent trade between the pre-check and the write
//! is still rejected rather than overdrawing.

use chrono::{NaiveDateTime, Utc};
use tracing::{info, warn};

use super::error::TraderError;
use super::ledger::{Fill, TradeReceipt};
use super::order::OrderRequest;
use super::quote::Quote;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::quote_port::QuotePort;

/// Look up a quote, collapsing "unknown" and transport failures into
/// `SymbolNotFound`.
pub async fn require_quote(quotes: &dyn QuotePort, symbol: &str) -> Result<Quote, TraderError> {
    match quotes.lookup(symbol).await {
        Ok(Some(quote)) if quote.price > rust_decimal::Decimal::ZERO => Ok(quote),
        Ok(Some(quote)) => {
            warn!(%symbol, price = %quote.price, "quote has non-positive price");
            Err(TraderError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
        Ok(None) => Err(TraderError::SymbolNotFound {
            symbol: symbol.to_string(),
        }),
        Err(e) => {
            warn!(%symbol, error = %e, "quote lookup failed");
            Err(TraderError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub async fn buy(
    ledger: &dyn LedgerPort,
    quotes: &dyn QuotePort,
    user_id: i64,
    order: &OrderRequest,
) -> Result<TradeReceipt, TraderError> {
    let quote = require_quote(quotes, &order.symbol).await?;

    let fill = Fill {
        user_id,
        symbol: order.symbol.clone(),
        shares: order.shares,
        price: quote.price,
        executed_at: now(),
    };

    let user = ledger
        .find_user(user_id)?
        .ok_or_else(|| TraderError::authentication("unknown user"))?;
    if fill.notional() > user.cash {
        return Err(TraderError::InsufficientFunds {
            needed: fill.notional(),
            available: user.cash,
        });
    }

    let receipt = ledger.record_buy(&fill)?;
    info!(
        user_id,
        symbol = %receipt.symbol,
        shares = receipt.shares,
        price = %receipt.price,
        cash_after = %receipt.cash_after,
        "buy filled"
    );
    Ok(receipt)
}

pub async fn sell(
    ledger: &dyn LedgerPort,
    quotes: &dyn QuotePort,
    user_id: i64,
    order: &OrderRequest,
) -> Result<TradeReceipt, TraderError> {
    let held = ledger
        .holding(user_id, &order.symbol)?
        .map(|h| h.shares)
        .unwrap_or(0);
    if order.shares > held {
        return Err(TraderError::InsufficientShares {
            symbol: order.symbol.clone(),
            requested: order.shares,
            held,
        });
    }

    let quote = require_quote(quotes, &order.symbol).await?;

    let fill = Fill {
        user_id,
        symbol: order.symbol.clone(),
        shares: order.shares,
        price: quote.price,
        executed_at: now(),
    };

    let receipt = ledger.record_sell(&fill)?;
    info!(
        user_id,
        symbol = %receipt.symbol,
        shares = receipt.shares,
        price = %receipt.price,
        cash_after = %receipt.cash_after,
        "sell filled"
    );
    Ok(receipt)
}
