//! Web server adapter.
//!
//! Axum router with server-side sessions. Sessions live in SQLite when
//! `[auth] session_db` is set, otherwise in memory.

mod auth;
mod error;
mod handlers;
mod templates;

pub use auth::{Backend, CurrentUser, SessionUser};
pub use error::WebError;
pub use handlers::*;
pub use templates::*;

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use axum_login::{login_required, AuthManagerLayerBuilder};
use rust_decimal::Decimal;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_sessions::cookie::Key;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_rusqlite_store::RusqliteStore;
use tracing::{info, warn};

use crate::domain::error::TraderError;
use crate::domain::settings::{session_lifetime, starting_cash};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::quote_port::QuotePort;

pub struct AppState {
    pub ledger: Arc<dyn LedgerPort>,
    pub quotes: Arc<dyn QuotePort>,
    pub config: Arc<dyn ConfigPort + Send + Sync>,
    pub starting_cash: Decimal,
}

impl AppState {
    pub fn new(
        ledger: Arc<dyn LedgerPort>,
        quotes: Arc<dyn QuotePort>,
        config: Arc<dyn ConfigPort + Send + Sync>,
    ) -> Result<Self, TraderError> {
        let starting_cash = starting_cash(&*config)?;
        Ok(Self {
            ledger,
            quotes,
            config,
            starting_cash,
        })
    }
}

/// Signing key for session cookies: 128 hex characters in `[auth]
/// session_secret`. Without one a random key is used and sessions do not
/// survive a restart.
fn session_key(config: &dyn ConfigPort) -> Result<Key, TraderError> {
    let invalid = |reason: String| TraderError::ConfigInvalid {
        section: "auth".into(),
        key: "session_secret".into(),
        reason,
    };
    match config.get_string("auth", "session_secret") {
        Some(secret) => {
            let bytes = hex::decode(secret.trim()).map_err(|e| invalid(e.to_string()))?;
            Key::try_from(bytes.as_slice())
                .map_err(|_| invalid("expected 64 bytes (128 hex characters)".into()))
        }
        None => {
            warn!("no [auth] session_secret configured; using a random key");
            Ok(Key::generate())
        }
    }
}

fn assemble<Store>(state: AppState, session_store: Store, key: Key, lifetime: i64) -> Router
where
    Store: SessionStore + Clone,
{
    let secure = state.config.get_bool("web", "secure_cookies", false);

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(lifetime)))
        .with_signed(key);

    let backend = Backend::new(Arc::clone(&state.ledger));
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    Router::new()
        .route("/", get(handlers::portfolio))
        .route("/buy", get(handlers::buy_form).post(handlers::buy))
        .route("/sell", get(handlers::sell_form).post(handlers::sell))
        .route("/quote", get(handlers::quote_form).post(handlers::quote))
        .route("/history", get(handlers::history))
        .route_layer(login_required!(Backend, login_url = "/login"))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        .nest_service("/static", ServeDir::new("static"))
        .fallback(handlers::not_found)
        .layer(auth_layer)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .with_state(Arc::new(state))
}

pub async fn build_router(state: AppState) -> Result<Router, TraderError> {
    let key = session_key(&*state.config)?;
    let lifetime = session_lifetime(&*state.config)?;

    match state.config.get_string("auth", "session_db") {
        Some(path) => {
            let session_error = |reason: String| TraderError::Database { reason };
            let conn = tokio_rusqlite::Connection::open(&path)
                .await
                .map_err(|e| session_error(e.to_string()))?;
            let store = RusqliteStore::new(conn);
            store
                .migrate()
                .await
                .map_err(|e| session_error(e.to_string()))?;
            info!(%path, "storing sessions in sqlite");
            Ok(assemble(state, store, key, lifetime))
        }
        None => Ok(assemble(state, MemoryStore::default(), key, lifetime)),
    }
}
