//! Domain primitives, aggregates, and services.
//!
//! Purpose: define the strongly typed model of accounts, sessions, and the
//! hospital directory, plus the ports and services that operate on them.
//! Keep invariants and serialisation contracts (serde) documented in each
//! type's Rustdoc; transport concerns stay in the inbound adapters.
//!
//! Public surface:
//! - Error / ErrorCode — transport-agnostic failure envelope.
//! - Account, Hospital, SessionRecord — the three aggregates.
//! - AccountLifecycle, HospitalDirectory — driving ports for handlers.
//! - AccountRepository, HospitalRepository, SessionStore — driven ports.

pub mod account;
pub mod accounts;
pub mod auth;
pub mod error;
pub mod geo;
pub mod hospital;
pub mod hospitals;
pub mod password;
pub mod ports;
pub mod sessions;
pub mod trace_id;

pub use self::account::{
    Account, AccountId, AccountUpdate, LoginId, LoginIdValidationError, NewAccount, PasswordDigest,
};
pub use self::accounts::{AccountLifecycle, AccountService, ProfileUpdate, RegistrationRequest};
pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::error::{Error, ErrorCode};
pub use self::geo::{Coordinate, CoordinateValidationError, EARTH_RADIUS_KM};
pub use self::hospital::{
    Department, DepartmentId, Hospital, HospitalId, HospitalUpdate, NewHospital,
};
pub use self::hospitals::{HospitalDirectory, HospitalService, RankedHospital};
pub use self::password::{Argon2PasswordHasher, PasswordHashError, PasswordHasher};
pub use self::ports::{
    AccountPersistenceError, AccountRepository, HospitalPersistenceError, HospitalRepository,
    SessionResolveError, SessionStore,
};
pub use self::sessions::{
    DEFAULT_SESSION_TIMEOUT_SECS, SessionRecord, SessionState, SessionToken,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
pub type ApiResult<T> = Result<T, Error>;
