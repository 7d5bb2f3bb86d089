//! Quote lookup port trait.

use async_trait::async_trait;

use crate::domain::error::TraderError;
use crate::domain::quote::Quote;

#[async_trait]
pub trait QuotePort: Send + Sync {
    /// Current quote for `symbol`, or `None` when the symbol is unknown.
    /// Transport failures are errors.
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, TraderError>;
}
