//! Holdings, transaction history and the fills that mutate them.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Timestamp format used for persisted and displayed transaction times.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A user's current position in one symbol. `shares` is always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub user_id: i64,
    pub symbol: String,
    pub shares: i64,
}

/// One immutable history row. Positive shares are buys, negative are sells.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub symbol: String,
    pub shares: i64,
    pub price: Decimal,
    pub executed_at: NaiveDateTime,
}

impl Transaction {
    pub fn is_buy(&self) -> bool {
        self.shares > 0
    }

    /// Cash moved by this transaction, negative for buys.
    pub fn cash_delta(&self) -> Decimal {
        -(self.price * Decimal::from(self.shares))
    }
}

/// A priced order ready to be applied to the ledger. `shares` is the
/// unsigned quantity; direction is chosen by the ledger call.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub user_id: i64,
    pub symbol: String,
    pub shares: i64,
    pub price: Decimal,
    pub executed_at: NaiveDateTime,
}

impl Fill {
    pub fn notional(&self) -> Decimal {
        self.price * Decimal::from(self.shares)
    }
}

/// Outcome of a fill applied to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeReceipt {
    pub symbol: String,
    /// Signed as recorded in history.
    pub shares: i64,
    pub price: Decimal,
    pub cash_after: Decimal,
    /// Shares held after the trade; zero means the holding was removed.
    pub shares_after: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn cash_delta_sign_follows_direction() {
        let buy = Transaction {
            id: 1,
            user_id: 1,
            symbol: "AAPL".into(),
            shares: 10,
            price: Decimal::from(150),
            executed_at: at(),
        };
        assert!(buy.is_buy());
        assert_eq!(buy.cash_delta(), Decimal::from(-1500));

        let sell = Transaction {
            shares: -5,
            price: Decimal::from(160),
            ..buy
        };
        assert!(!sell.is_buy());
        assert_eq!(sell.cash_delta(), Decimal::from(800));
    }

    #[test]
    fn fill_notional() {
        let fill = Fill {
            user_id: 1,
            symbol: "MSFT".into(),
            shares: 3,
            price: Decimal::new(10125, 2),
            executed_at: at(),
        };
        assert_eq!(fill.notional(), Decimal::new(30375, 2));
    }
}
