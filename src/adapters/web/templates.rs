//! HTML templates using Askama.
//!
//! Amounts are formatted before they reach a template, so templates only
//! ever see strings and integers.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::domain::ledger::{Transaction, TIMESTAMP_FORMAT};
use crate::domain::money::usd;
use crate::domain::portfolio::{PortfolioView, PositionValuation, PriceSource};
use crate::domain::quote::Quote;

use super::WebError;

pub fn render<T: Template>(template: &T) -> Result<Response, WebError> {
    render_with_status(StatusCode::OK, template)
}

pub fn render_with_status<T: Template>(
    status: StatusCode,
    template: &T,
) -> Result<Response, WebError> {
    let html = template
        .render()
        .map_err(|e| WebError::internal(format!("template error: {e}")))?;
    Ok((status, Html(html)).into_response())
}

pub struct PositionRow {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: String,
    pub value: String,
    pub note: &'static str,
}

impl From<&PositionValuation> for PositionRow {
    fn from(p: &PositionValuation) -> Self {
        Self {
            symbol: p.symbol.clone(),
            name: p.name.clone().unwrap_or_else(|| p.symbol.clone()),
            shares: p.shares,
            price: p.price.map(usd).unwrap_or_else(|| "n/a".to_string()),
            value: usd(p.value),
            note: match p.source {
                PriceSource::Live => "",
                PriceSource::LastTrade => "last trade price",
                PriceSource::Unavailable => "price unavailable",
            },
        }
    }
}

#[derive(Template)]
#[template(path = "portfolio.html")]
pub struct PortfolioTemplate {
    pub user: Option<String>,
    pub rows: Vec<PositionRow>,
    pub cash: String,
    pub holdings_value: String,
    pub net_worth: String,
    pub stale: bool,
}

impl PortfolioTemplate {
    pub fn new(username: &str, view: &PortfolioView) -> Self {
        Self {
            user: Some(username.to_string()),
            rows: view.positions.iter().map(PositionRow::from).collect(),
            cash: usd(view.cash),
            holdings_value: usd(view.holdings_value),
            net_worth: usd(view.net_worth),
            stale: view.has_stale_prices(),
        }
    }
}

pub struct HistoryRow {
    pub kind: &'static str,
    pub symbol: String,
    pub shares: i64,
    pub price: String,
    pub total: String,
    pub executed_at: String,
}

impl From<&Transaction> for HistoryRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            kind: if tx.is_buy() { "Buy" } else { "Sell" },
            symbol: tx.symbol.clone(),
            shares: tx.shares,
            price: usd(tx.price),
            total: usd(tx.cash_delta()),
            executed_at: tx.executed_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryTemplate {
    pub user: Option<String>,
    pub rows: Vec<HistoryRow>,
}

#[derive(Template)]
#[template(path = "buy.html")]
pub struct BuyTemplate {
    pub user: Option<String>,
}

#[derive(Template)]
#[template(path = "sell.html")]
pub struct SellTemplate {
    pub user: Option<String>,
    pub symbols: Vec<String>,
}

#[derive(Template)]
#[template(path = "quote.html")]
pub struct QuoteFormTemplate {
    pub user: Option<String>,
}

#[derive(Template)]
#[template(path = "quoted.html")]
pub struct QuotedTemplate {
    pub user: Option<String>,
    pub symbol: String,
    pub name: String,
    pub price: String,
}

impl QuotedTemplate {
    pub fn new(username: &str, quote: &Quote) -> Self {
        Self {
            user: Some(username.to_string()),
            symbol: quote.symbol.clone(),
            name: quote.name.clone(),
            price: usd(quote.price),
        }
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub user: Option<String>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub user: Option<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub user: Option<String>,
    pub message: String,
    pub status: u16,
}
