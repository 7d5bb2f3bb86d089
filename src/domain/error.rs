//! Domain error types.

use rust_decimal::Decimal;

/// Top-level error type for simtrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("{reason}")]
    Validation { reason: String },

    #[error("{reason}")]
    Authentication { reason: String },

    #[error("username {username} is already taken")]
    DuplicateUsername { username: String },

    #[error("symbol {symbol} not found")]
    SymbolNotFound { symbol: String },

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    #[error("insufficient shares of {symbol}: requested {requested}, held {held}")]
    InsufficientShares {
        symbol: String,
        requested: i64,
        held: i64,
    },

    #[error("quote service error for {symbol}: {reason}")]
    QuoteService { symbol: String, reason: String },

    #[error("password hashing failed: {reason}")]
    PasswordHash { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    /// True for failures caused by the request rather than the system:
    /// bad input, bad credentials, or a rejected trade.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            TraderError::Validation { .. }
                | TraderError::Authentication { .. }
                | TraderError::DuplicateUsername { .. }
                | TraderError::SymbolNotFound { .. }
                | TraderError::InsufficientFunds { .. }
                | TraderError::InsufficientShares { .. }
        )
    }
}

impl From<r2d2::Error> for TraderError {
    fn from(err: r2d2::Error) -> Self {
        TraderError::Database {
            reason: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for TraderError {
    fn from(err: rusqlite::Error) -> Self {
        TraderError::DatabaseQuery {
            reason: err.to_string(),
        }
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) | TraderError::PasswordHash { .. } => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::Database { .. } | TraderError::DatabaseQuery { .. } => 3,
            TraderError::SymbolNotFound { .. } | TraderError::QuoteService { .. } => 4,
            TraderError::Validation { .. }
            | TraderError::Authentication { .. }
            | TraderError::DuplicateUsername { .. }
            | TraderError::InsufficientFunds { .. }
            | TraderError::InsufficientShares { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_are_user_facing() {
        assert!(TraderError::validation("bad").is_user_facing());
        assert!(
            TraderError::InsufficientShares {
                symbol: "AAPL".into(),
                requested: 5,
                held: 1,
            }
            .is_user_facing()
        );
        assert!(
            !TraderError::Database {
                reason: "locked".into()
            }
            .is_user_facing()
        );
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = TraderError::SymbolNotFound {
            symbol: "ZZZZ".into(),
        };
        assert_eq!(err.to_string(), "symbol ZZZZ not found");

        let err = TraderError::DuplicateUsername {
            username: "alice".into(),
        };
        assert!(err.to_string().contains("alice"));
    }
}
