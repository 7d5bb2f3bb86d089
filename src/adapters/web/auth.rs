//! Authentication backend for axum-login, plus the `CurrentUser` extractor
//! handlers use to learn who is calling.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_login::{AuthSession, AuthUser, AuthnBackend, UserId};
use std::sync::Arc;

use crate::domain::account::{self, User};
use crate::domain::error::TraderError;
use crate::ports::ledger_port::LedgerPort;

/// The user record kept in the session.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    /// The password hash string as bytes, used by axum-login to validate sessions.
    pw_hash_bytes: Vec<u8>,
}

impl std::fmt::Debug for SessionUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            pw_hash_bytes: user.password_hash.into_bytes(),
        }
    }
}

impl AuthUser for SessionUser {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn session_auth_hash(&self) -> &[u8] {
        &self.pw_hash_bytes
    }
}

/// Login credentials submitted via the login form.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Authentication backend that verifies against the account store.
#[derive(Clone)]
pub struct Backend {
    ledger: Arc<dyn LedgerPort>,
}

impl Backend {
    pub fn new(ledger: Arc<dyn LedgerPort>) -> Self {
        Self { ledger }
    }
}

impl AuthnBackend for Backend {
    type User = SessionUser;
    type Credentials = Credentials;
    type Error = TraderError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        match account::authenticate(&*self.ledger, &creds.username, &creds.password) {
            Ok(user) => Ok(Some(user.into())),
            Err(TraderError::Authentication { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_user(
        &self,
        user_id: &UserId<Self>,
    ) -> Result<Option<Self::User>, Self::Error> {
        Ok(self.ledger.find_user(*user_id)?.map(SessionUser::from))
    }
}

pub type TraderAuthSession = AuthSession<Backend>;

/// The authenticated caller, injected into protected handlers.
/// Requests without a valid session are redirected to `/login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_session = TraderAuthSession::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match auth_session.user {
            Some(user) => Ok(CurrentUser {
                id: user.id,
                username: user.username,
            }),
            None => Err(Redirect::to("/login").into_response()),
        }
    }
}
