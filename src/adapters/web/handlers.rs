//! HTTP request handlers for web adapter.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::account::{self, Registration};
use crate::domain::order::{normalize_symbol, OrderRequest};
use crate::domain::portfolio::build_portfolio;
use crate::domain::trading;

use super::auth::{Credentials, CurrentUser, TraderAuthSession};
use super::templates::{
    render, render_with_status, BuyTemplate, HistoryRow, HistoryTemplate, LoginTemplate,
    PortfolioTemplate, QuoteFormTemplate, QuotedTemplate, RegisterTemplate, SellTemplate,
};
use super::{AppState, WebError};

pub async fn portfolio(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Response, WebError> {
    let view = build_portfolio(&*state.ledger, &*state.quotes, user.id).await?;
    render(&PortfolioTemplate::new(&user.username, &view))
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OrderForm {
    pub symbol: String,
    pub shares: String,
}

pub async fn buy_form(user: CurrentUser) -> Result<Response, WebError> {
    render(&BuyTemplate {
        user: Some(user.username),
    })
}

pub async fn buy(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Form(form): Form<OrderForm>,
) -> Result<Response, WebError> {
    let order = OrderRequest::parse(&form.symbol, &form.shares)?;
    trading::buy(&*state.ledger, &*state.quotes, user.id, &order).await?;
    Ok(Redirect::to("/").into_response())
}

pub async fn sell_form(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Response, WebError> {
    let symbols = state
        .ledger
        .holdings(user.id)?
        .into_iter()
        .map(|h| h.symbol)
        .collect();
    render(&SellTemplate {
        user: Some(user.username),
        symbols,
    })
}

pub async fn sell(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Form(form): Form<OrderForm>,
) -> Result<Response, WebError> {
    let order = OrderRequest::parse(&form.symbol, &form.shares)?;
    trading::sell(&*state.ledger, &*state.quotes, user.id, &order).await?;
    Ok(Redirect::to("/").into_response())
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Response, WebError> {
    let rows = state
        .ledger
        .history(user.id)?
        .iter()
        .map(HistoryRow::from)
        .collect();
    render(&HistoryTemplate {
        user: Some(user.username),
        rows,
    })
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct QuoteForm {
    pub symbol: String,
}

pub async fn quote_form(user: CurrentUser) -> Result<Response, WebError> {
    render(&QuoteFormTemplate {
        user: Some(user.username),
    })
}

pub async fn quote(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Form(form): Form<QuoteForm>,
) -> Result<Response, WebError> {
    let symbol = normalize_symbol(&form.symbol)?;
    let quote = trading::require_quote(&*state.quotes, &symbol).await?;
    render(&QuotedTemplate::new(&user.username, &quote))
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Showing the login page forgets any current session.
pub async fn login_form(mut auth_session: TraderAuthSession) -> Result<Response, WebError> {
    auth_session
        .logout()
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    render(&LoginTemplate {
        user: None,
        error: None,
    })
}

pub async fn login(
    mut auth_session: TraderAuthSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let blank = if form.username.trim().is_empty() {
        Some("must provide username")
    } else if form.password.is_empty() {
        Some("must provide password")
    } else {
        None
    };
    if let Some(message) = blank {
        return login_failed(message);
    }

    let user = match auth_session
        .authenticate(Credentials {
            username: form.username.clone(),
            password: form.password,
        })
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(username = %form.username.trim(), "failed login");
            return login_failed("invalid username and/or password");
        }
        Err(e) => return Err(WebError::internal(e.to_string())),
    };

    auth_session
        .login(&user)
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    info!(user_id = user.id, "logged in");

    Ok(Redirect::to("/").into_response())
}

fn login_failed(message: &str) -> Result<Response, WebError> {
    render_with_status(
        StatusCode::FORBIDDEN,
        &LoginTemplate {
            user: None,
            error: Some(message.to_string()),
        },
    )
}

pub async fn logout(mut auth_session: TraderAuthSession) -> Result<Response, WebError> {
    auth_session
        .logout()
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    Ok(Redirect::to("/login").into_response())
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirmation: String,
}

pub async fn register_form() -> Result<Response, WebError> {
    render(&RegisterTemplate { user: None })
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, WebError> {
    let registration = Registration {
        username: form.username,
        password: form.password,
        confirmation: form.confirmation,
    };
    account::register(&*state.ledger, &registration, state.starting_cash)?;
    Ok(Redirect::to("/login").into_response())
}

pub async fn not_found() -> WebError {
    WebError::not_found("page not found")
}
