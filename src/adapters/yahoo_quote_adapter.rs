//! Quote adapter backed by the Yahoo Finance chart endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::domain::error::TraderError;
use crate::domain::quote::Quote;
use crate::domain::settings::{quote_timeout, DEFAULT_YAHOO_BASE_URL};
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;

pub struct YahooQuoteAdapter {
    base_url: String,
    client: reqwest::Client,
}

impl YahooQuoteAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TraderError> {
        let client = reqwest::Client::builder()
            .user_agent("simtrader/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| TraderError::ConfigInvalid {
                section: "quotes".into(),
                key: "base_url".into(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        let base_url = config
            .get_string("quotes", "base_url")
            .unwrap_or_else(|| DEFAULT_YAHOO_BASE_URL.to_string());
        Self::new(&base_url, quote_timeout(config)?)
    }
}

/// Ticker characters Yahoo accepts; anything else cannot be a known symbol.
fn is_plausible_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= 16
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
}

#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Deserialize, Debug)]
struct ChartBody {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    symbol: Option<String>,
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(alias = "longName")]
    long_name: Option<String>,
    #[serde(alias = "shortName")]
    short_name: Option<String>,
}

#[async_trait]
impl QuotePort for YahooQuoteAdapter {
    #[instrument(name = "YahooQuoteLookup", skip(self), fields(symbol = %symbol))]
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, TraderError> {
        let symbol = symbol.trim().to_uppercase();
        if !is_plausible_symbol(&symbol) {
            return Ok(None);
        }

        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url, symbol
        );
        debug!("Requesting quote from {}", url);

        let service_error = |reason: String| TraderError::QuoteService {
            symbol: symbol.clone(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| service_error(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(service_error(format!("HTTP {}", response.status())));
        }

        let data = response
            .json::<ChartResponse>()
            .await
            .map_err(|e| service_error(e.to_string()))?;

        let Some(meta) = data
            .chart
            .result
            .and_then(|items| items.into_iter().next())
            .map(|item| item.meta)
        else {
            return Ok(None);
        };

        let Some(price) = meta
            .regular_market_price
            .and_then(Decimal::from_f64)
            .map(|p| p.round_dp(4))
        else {
            return Ok(None);
        };

        let quoted_symbol = meta.symbol.unwrap_or_else(|| symbol.clone());
        let name = meta
            .long_name
            .or(meta.short_name)
            .unwrap_or_else(|| quoted_symbol.clone());

        Ok(Some(Quote {
            symbol: quoted_symbol,
            name,
            price,
        }))
    }
}
