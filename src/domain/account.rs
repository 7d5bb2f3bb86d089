//! User accounts: registration input checks and password hashing.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;
use rust_decimal::Decimal;
use tracing::info;

use super::error::TraderError;
use crate::ports::ledger_port::LedgerPort;

/// A registered user as persisted in the account store.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub cash: Decimal,
}

/// Registration form input.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub confirmation: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), TraderError> {
        if self.username.trim().is_empty() {
            return Err(TraderError::validation("must provide username"));
        }
        if self.password.is_empty() {
            return Err(TraderError::validation("must provide password"));
        }
        if self.password != self.confirmation {
            return Err(TraderError::validation("passwords must match"));
        }
        Ok(())
    }

    pub fn username(&self) -> &str {
        self.username.trim()
    }
}

fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, TraderError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| TraderError::PasswordHash {
            reason: e.to_string(),
        })
}

/// Check a password against a stored PHC string. A malformed hash never verifies.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => hasher()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Validate, hash and store a new account funded with `starting_cash`.
pub fn register(
    ledger: &dyn LedgerPort,
    registration: &Registration,
    starting_cash: Decimal,
) -> Result<User, TraderError> {
    registration.validate()?;
    let username = registration.username();
    if ledger.find_user_by_name(username)?.is_some() {
        return Err(TraderError::DuplicateUsername {
            username: username.to_string(),
        });
    }

    let password_hash = hash_password(&registration.password)?;
    let user = ledger.create_user(username, &password_hash, starting_cash)?;
    info!(user_id = user.id, username = %user.username, "registered user");
    Ok(user)
}

/// Resolve credentials to a user. Unknown name and wrong password are
/// indistinguishable to the caller.
pub fn authenticate(
    ledger: &dyn LedgerPort,
    username: &str,
    password: &str,
) -> Result<User, TraderError> {
    if username.trim().is_empty() {
        return Err(TraderError::authentication("must provide username"));
    }
    if password.is_empty() {
        return Err(TraderError::authentication("must provide password"));
    }

    match ledger.find_user_by_name(username.trim())? {
        Some(user) if verify_password(password, &user.password_hash) => Ok(user),
        _ => Err(TraderError::authentication("invalid username and/or password")),
    }
}
