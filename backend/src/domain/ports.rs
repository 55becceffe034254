//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (account and hospital stores, the session store). Each trait exposes
//! strongly typed errors so adapters map their failures into predictable
//! variants instead of returning `anyhow::Result`.

use async_trait::async_trait;
use thiserror::Error;

use super::account::{Account, AccountId, AccountUpdate, LoginId, NewAccount};
use super::geo::CoordinateValidationError;
use super::hospital::{DepartmentId, Hospital, HospitalId, HospitalUpdate, NewHospital};
use super::sessions::SessionToken;

/// Persistence errors raised by [`AccountRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountPersistenceError {
    /// Another account already holds the login identifier.
    #[error("login identifier {login_id} is already registered")]
    DuplicateLoginId { login_id: String },
    /// Query or mutation failed during execution.
    #[error("account repository query failed: {message}")]
    Query { message: String },
}

impl AccountPersistenceError {
    /// Helper for uniqueness violations.
    pub fn duplicate(login_id: impl Into<String>) -> Self {
        Self::DuplicateLoginId {
            login_id: login_id.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence errors raised by [`HospitalRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HospitalPersistenceError {
    /// No hospital exists under the identifier.
    #[error("hospital {id} does not exist")]
    HospitalMissing { id: HospitalId },
    /// A department identifier does not appear in the catalogue.
    #[error("department {id} does not exist")]
    UnknownDepartment { id: DepartmentId },
    /// A merged coordinate failed re-validation.
    #[error(transparent)]
    InvalidCoordinate(#[from] CoordinateValidationError),
    /// Query or mutation failed during execution.
    #[error("hospital repository query failed: {message}")]
    Query { message: String },
}

impl HospitalPersistenceError {
    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Resolution failures raised by [`SessionStore::resolve`].
///
/// Callers surface every variant identically; the split exists for logging
/// and tests, not for the HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionResolveError {
    /// The token matches no stored session.
    #[error("session token is not known to the store")]
    Unknown,
    /// The session outlived its inactivity window.
    #[error("session expired through inactivity")]
    Expired,
    /// The session was invalidated by logout or a superseding login.
    #[error("session was invalidated")]
    Invalidated,
}

/// Persistence port for account aggregates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account, assigning its identity.
    ///
    /// Uniqueness of the login identifier is enforced here, atomically with
    /// the insert.
    async fn insert(&self, account: NewAccount) -> Result<Account, AccountPersistenceError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountPersistenceError>;

    /// Fetch an account by its login identifier.
    async fn find_by_login_id(
        &self,
        login_id: &LoginId,
    ) -> Result<Option<Account>, AccountPersistenceError>;

    /// Merge `update` into the stored account atomically.
    ///
    /// Returns the post-merge account, or `None` when the identifier is
    /// unknown.
    async fn update(
        &self,
        id: AccountId,
        update: AccountUpdate,
    ) -> Result<Option<Account>, AccountPersistenceError>;
}

/// Persistence port for hospital aggregates and the department catalogue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HospitalRepository: Send + Sync {
    /// Insert a new hospital, assigning its identity.
    async fn insert(&self, hospital: NewHospital) -> Result<Hospital, HospitalPersistenceError>;

    /// Fetch a hospital by identifier.
    async fn find_by_id(
        &self,
        id: HospitalId,
    ) -> Result<Option<Hospital>, HospitalPersistenceError>;

    /// Merge `update` into the stored hospital atomically.
    ///
    /// Returns the post-merge hospital, or `None` when the identifier is
    /// unknown.
    async fn update(
        &self,
        id: HospitalId,
        update: HospitalUpdate,
    ) -> Result<Option<Hospital>, HospitalPersistenceError>;

    /// Associate catalogue departments with a hospital.
    ///
    /// All identifiers are checked against the catalogue before any
    /// association lands, so a single unknown identifier rejects the whole
    /// call without partial effect. Re-adding an association is a no-op.
    async fn add_departments(
        &self,
        id: HospitalId,
        departments: &[DepartmentId],
    ) -> Result<Hospital, HospitalPersistenceError>;

    /// Every stored hospital, ordered by ascending identifier.
    async fn list_all(&self) -> Result<Vec<Hospital>, HospitalPersistenceError>;
}

/// Server-side session store keyed by opaque tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Open a fresh session for the account and return its token.
    ///
    /// Any prior active session for the same account is invalidated in the
    /// same step, so no interleaving can observe two live sessions.
    async fn begin(&self, account_id: AccountId) -> SessionToken;

    /// Resolve a token to its account, refreshing the inactivity window.
    async fn resolve(&self, token: SessionToken) -> Result<AccountId, SessionResolveError>;

    /// Invalidate the session behind `token`. Unknown and already-terminal
    /// tokens are ignored.
    async fn end(&self, token: SessionToken);
}
