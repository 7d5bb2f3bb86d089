//! HTTP error responses for web adapter.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::{error, info};

use crate::domain::error::TraderError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

/// 400 for bad input and rejected trades, 403 for bad credentials, 500 otherwise.
pub fn status_from_error(err: &TraderError) -> StatusCode {
    match err {
        TraderError::Validation { .. }
        | TraderError::DuplicateUsername { .. }
        | TraderError::SymbolNotFound { .. }
        | TraderError::InsufficientFunds { .. }
        | TraderError::InsufficientShares { .. } => StatusCode::BAD_REQUEST,
        TraderError::Authentication { .. } => StatusCode::FORBIDDEN,
        TraderError::QuoteService { .. }
        | TraderError::PasswordHash { .. }
        | TraderError::Database { .. }
        | TraderError::DatabaseQuery { .. }
        | TraderError::ConfigParse { .. }
        | TraderError::ConfigMissing { .. }
        | TraderError::ConfigInvalid { .. }
        | TraderError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<TraderError> for WebError {
    fn from(err: TraderError) -> Self {
        let status = status_from_error(&err);
        if err.is_user_facing() {
            info!(%status, error = %err, "request rejected");
            Self::new(status, err.to_string())
        } else {
            error!(%status, error = %err, "request failed");
            Self::new(status, "internal error")
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let template = super::templates::ErrorTemplate {
            user: None,
            message: self.message.clone(),
            status: self.status.as_u16(),
        };
        match template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn business_rule_failures_are_bad_request() {
        for err in [
            TraderError::validation("x"),
            TraderError::DuplicateUsername {
                username: "a".into(),
            },
            TraderError::SymbolNotFound {
                symbol: "ZZZ".into(),
            },
            TraderError::InsufficientFunds {
                needed: Decimal::from(2),
                available: Decimal::from(1),
            },
            TraderError::InsufficientShares {
                symbol: "A".into(),
                requested: 2,
                held: 1,
            },
        ] {
            assert_eq!(status_from_error(&err), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn auth_failure_is_forbidden() {
        assert_eq!(
            status_from_error(&TraderError::authentication("no")),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn infrastructure_detail_is_not_leaked() {
        let web: WebError = TraderError::DatabaseQuery {
            reason: "no such table: users".into(),
        }
        .into();
        assert_eq!(web.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(web.message, "internal error");
    }
}
