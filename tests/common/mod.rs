#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use simtrader::adapters::sqlite_adapter::SqliteAdapter;
use simtrader::adapters::static_quote_adapter::StaticQuoteAdapter;
use simtrader::domain::account::{self, Registration, User};
use simtrader::domain::error::TraderError;
use simtrader::domain::ledger::{Fill, Holding, TradeReceipt, Transaction};
use simtrader::domain::quote::Quote;
use simtrader::ports::config_port::ConfigPort;
use simtrader::ports::ledger_port::LedgerPort;
use simtrader::ports::quote_port::QuotePort;
use std::collections::HashMap;
use std::sync::Arc;

pub const TEST_PASSWORD: &str = "testpass123";

pub const SESSION_SECRET: &str = "00000000000000000000000000000001\
                                  00000000000000000000000000000001\
                                  00000000000000000000000000000001\
                                  00000000000000000000000000000001";

pub fn dec(text: &str) -> Decimal {
    text.parse().unwrap()
}

pub fn ledger() -> Arc<SqliteAdapter> {
    let adapter = SqliteAdapter::in_memory().unwrap();
    adapter.initialize_schema().unwrap();
    Arc::new(adapter)
}

/// AAPL at 150, MSFT at 300.
pub fn quotes() -> Arc<StaticQuoteAdapter> {
    Arc::new(
        StaticQuoteAdapter::new()
            .with_quote("AAPL", "Apple Inc.", dec("150"))
            .with_quote("MSFT", "Microsoft Corporation", dec("300")),
    )
}

pub fn register_user(ledger: &SqliteAdapter, username: &str) -> User {
    account::register(
        ledger,
        &Registration {
            username: username.to_string(),
            password: TEST_PASSWORD.to_string(),
            confirmation: TEST_PASSWORD.to_string(),
        },
        dec("10000.00"),
    )
    .unwrap()
}

/// Insert a user directly, skipping password hashing.
pub fn funded_user(ledger: &SqliteAdapter, username: &str) -> User {
    ledger
        .create_user(username, "unused-hash", dec("10000.00"))
        .unwrap()
}

/// Every lookup fails as if the provider were unreachable.
pub struct FailingQuotePort;

#[async_trait]
impl QuotePort for FailingQuotePort {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, TraderError> {
        Err(TraderError::QuoteService {
            symbol: symbol.to_string(),
            reason: "connection refused".into(),
        })
    }
}

/// Ledger that forgets trade prices, so holdings have no fallback price.
pub struct NoTradePriceLedger(pub Arc<SqliteAdapter>);

impl LedgerPort for NoTradePriceLedger {
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        cash: Decimal,
    ) -> Result<User, TraderError> {
        self.0.create_user(username, password_hash, cash)
    }

    fn find_user(&self, user_id: i64) -> Result<Option<User>, TraderError> {
        self.0.find_user(user_id)
    }

    fn find_user_by_name(&self, username: &str) -> Result<Option<User>, TraderError> {
        self.0.find_user_by_name(username)
    }

    fn holdings(&self, user_id: i64) -> Result<Vec<Holding>, TraderError> {
        self.0.holdings(user_id)
    }

    fn holding(&self, user_id: i64, symbol: &str) -> Result<Option<Holding>, TraderError> {
        self.0.holding(user_id, symbol)
    }

    fn history(&self, user_id: i64) -> Result<Vec<Transaction>, TraderError> {
        self.0.history(user_id)
    }

    fn last_trade_price(
        &self,
        _user_id: i64,
        _symbol: &str,
    ) -> Result<Option<Decimal>, TraderError> {
        Ok(None)
    }

    fn record_buy(&self, fill: &Fill) -> Result<TradeReceipt, TraderError> {
        self.0.record_buy(fill)
    }

    fn record_sell(&self, fill: &Fill) -> Result<TradeReceipt, TraderError> {
        self.0.record_sell(fill)
    }
}

#[derive(Default)]
pub struct MockConfigPort {
    values: HashMap<(String, String), String>,
}

impl MockConfigPort {
    pub fn new() -> Self {
        Self::default().with("auth", "session_secret", SESSION_SECRET)
    }

    pub fn with(mut self, section: &str, key: &str, value: &str) -> Self {
        self.values
            .insert((section.to_string(), key.to_string()), value.to_string());
        self
    }
}

impl ConfigPort for MockConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.values
            .get(&(section.to_string(), key.to_string()))
            .cloned()
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn section_keys(&self, section: &str) -> Vec<String> {
        self.values
            .keys()
            .filter(|(s, _)| s == section)
            .map(|(_, k)| k.clone())
            .collect()
    }
}

#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, Response, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use simtrader::adapters::web::{build_router, AppState};
    use tower::ServiceExt;

    pub async fn create_app(ledger: Arc<dyn LedgerPort>, quotes: Arc<dyn QuotePort>) -> Router {
        let state = AppState::new(ledger, quotes, Arc::new(MockConfigPort::new())).unwrap();
        build_router(state).await.unwrap()
    }

    pub fn extract_cookies(response: &Response<Body>) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .collect()
    }

    pub fn build_cookie_header(set_cookies: &[String]) -> String {
        set_cookies
            .iter()
            .map(|sc| sc.split(';').next().unwrap_or("").to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn location(response: &Response<Body>) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    pub fn post_form(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(form.to_string())).unwrap()
    }

    pub async fn body_string(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Log in and return the cookie header for the new session.
    pub async fn login(app: &Router, username: &str, password: &str) -> String {
        let form = format!("username={username}&password={password}");
        let response = app
            .clone()
            .oneshot(post_form("/login", &form, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        build_cookie_header(&extract_cookies(&response))
    }
}
