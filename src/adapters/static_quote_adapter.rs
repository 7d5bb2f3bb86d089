//! Fixed-price quote table, read from the `[static_quotes]` config section.
//!
//! Each entry is `SYMBOL = price[,Company name]`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::error::TraderError;
use crate::domain::money::parse_amount;
use crate::domain::order::normalize_symbol;
use crate::domain::quote::Quote;
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;

#[derive(Default)]
pub struct StaticQuoteAdapter {
    quotes: RwLock<HashMap<String, Quote>>,
}

impl StaticQuoteAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(self, symbol: &str, name: &str, price: rust_decimal::Decimal) -> Self {
        self.set_quote(symbol, name, price);
        self
    }

    /// Insert or replace a price.
    pub fn set_quote(&self, symbol: &str, name: &str, price: rust_decimal::Decimal) {
        let symbol = symbol.trim().to_uppercase();
        let quote = Quote {
            symbol: symbol.clone(),
            name: name.to_string(),
            price,
        };
        if let Ok(mut quotes) = self.quotes.write() {
            quotes.insert(symbol, quote);
        }
    }

    pub fn remove_quote(&self, symbol: &str) {
        if let Ok(mut quotes) = self.quotes.write() {
            quotes.remove(&symbol.trim().to_uppercase());
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        let adapter = Self::new();
        for key in config.section_keys("static_quotes") {
            let Some(value) = config.get_string("static_quotes", &key) else {
                continue;
            };
            let symbol = normalize_symbol(&key)?;
            let (price, name) = match value.split_once(',') {
                Some((price, name)) => (price, name.trim()),
                None => (value.as_str(), ""),
            };
            let price = parse_amount(price).map_err(|e| TraderError::ConfigInvalid {
                section: "static_quotes".into(),
                key: key.clone(),
                reason: e.to_string(),
            })?;
            let name = if name.is_empty() { symbol.as_str() } else { name };
            adapter.set_quote(&symbol, name, price);
        }
        Ok(adapter)
    }
}

#[async_trait]
impl QuotePort for StaticQuoteAdapter {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, TraderError> {
        let quotes = self.quotes.read().map_err(|e| TraderError::QuoteService {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?;
        Ok(quotes.get(&symbol.trim().to_uppercase()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let adapter = StaticQuoteAdapter::new().with_quote("AAPL", "Apple", Decimal::from(150));
        let quote = adapter.lookup(" aapl").await.unwrap().unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, Decimal::from(150));
        assert!(adapter.lookup("MSFT").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prices_can_move_and_disappear() {
        let adapter = StaticQuoteAdapter::new().with_quote("AAPL", "Apple", Decimal::from(150));
        adapter.set_quote("AAPL", "Apple", Decimal::from(160));
        assert_eq!(
            adapter.lookup("AAPL").await.unwrap().unwrap().price,
            Decimal::from(160)
        );
        adapter.remove_quote("aapl");
        assert!(adapter.lookup("AAPL").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn from_config_reads_price_and_optional_name() {
        let config = FileConfigAdapter::from_string(
            "[static_quotes]\nAAPL = 150.25, Apple Inc.\nIBM = 99\n",
        )
        .unwrap();
        let adapter = StaticQuoteAdapter::from_config(&config).unwrap();

        let apple = adapter.lookup("AAPL").await.unwrap().unwrap();
        assert_eq!(apple.name, "Apple Inc.");
        assert_eq!(apple.price, Decimal::new(15025, 2));

        let ibm = adapter.lookup("IBM").await.unwrap().unwrap();
        assert_eq!(ibm.name, "IBM");
    }

    #[test]
    fn from_config_rejects_bad_price() {
        let config = FileConfigAdapter::from_string("[static_quotes]\nAAPL = cheap\n").unwrap();
        assert!(matches!(
            StaticQuoteAdapter::from_config(&config),
            Err(TraderError::ConfigInvalid { .. })
        ));
    }
}
