//! Persistence port for accounts, holdings and transaction history.

use rust_decimal::Decimal;

use crate::domain::account::User;
use crate::domain::error::TraderError;
use crate::domain::ledger::{Fill, Holding, TradeReceipt, Transaction};

pub trait LedgerPort: Send + Sync {
    /// Insert a user. Fails with `DuplicateUsername` if the name is taken.
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        cash: Decimal,
    ) -> Result<User, TraderError>;

    fn find_user(&self, user_id: i64) -> Result<Option<User>, TraderError>;

    fn find_user_by_name(&self, username: &str) -> Result<Option<User>, TraderError>;

    /// Holdings ordered by symbol.
    fn holdings(&self, user_id: i64) -> Result<Vec<Holding>, TraderError>;

    fn holding(&self, user_id: i64, symbol: &str) -> Result<Option<Holding>, TraderError>;

    /// History in execution order, oldest first.
    fn history(&self, user_id: i64) -> Result<Vec<Transaction>, TraderError>;

    /// Price of the user's most recent transaction in `symbol`.
    fn last_trade_price(&self, user_id: i64, symbol: &str)
        -> Result<Option<Decimal>, TraderError>;

    /// Debit cash, add shares and append a positive history row, all or nothing.
    /// Fails with `InsufficientFunds` when the cost exceeds current cash.
    fn record_buy(&self, fill: &Fill) -> Result<TradeReceipt, TraderError>;

    /// Credit cash, remove shares and append a negative history row, all or
    /// nothing. Fails with `InsufficientShares` when the holding is too small.
    fn record_sell(&self, fill: &Fill) -> Result<TradeReceipt, TraderError>;
}
