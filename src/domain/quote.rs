//! Stock quote value type.

use rust_decimal::Decimal;

/// A point-in-time price for a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
}
