//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The cookie holds nothing but the opaque server-side token; every check
//! against it goes through the [`SessionStore`] port. Any resolution failure
//! purges the cookie so a dead token is not replayed on later requests.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{AccountId, Error, SessionStore, SessionToken};

pub(crate) const TOKEN_KEY: &str = "token";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying actix session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the opaque session token in the cookie.
    pub fn persist_token(&self, token: SessionToken) -> Result<(), Error> {
        self.0
            .insert(TOKEN_KEY, token.to_string())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the session token from the cookie, if present and well-formed.
    ///
    /// A cookie carrying an unparseable token is purged and treated as
    /// absent.
    pub fn token(&self) -> Result<Option<SessionToken>, Error> {
        let raw = self
            .0
            .get::<String>(TOKEN_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        match raw {
            Some(raw) => match raw.parse::<SessionToken>() {
                Ok(token) => Ok(Some(token)),
                Err(error) => {
                    warn!("invalid session token in cookie: {error}");
                    self.clear();
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Drop all session state from the cookie.
    pub fn clear(&self) {
        self.0.purge();
    }

    /// Resolve the cookie's token against the store or return
    /// `401 Unauthorized`.
    ///
    /// Unknown, expired, and invalidated tokens all produce the same error;
    /// the cookie is purged so the dead token stops arriving.
    pub async fn require_account(&self, store: &dyn SessionStore) -> Result<AccountId, Error> {
        let Some(token) = self.token()? else {
            return Err(Error::unauthorized("login required"));
        };

        match store.resolve(token).await {
            Ok(account_id) => Ok(account_id),
            Err(reason) => {
                warn!(%reason, "session token failed to resolve");
                self.clear();
                Err(Error::unauthorized("login required"))
            }
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
