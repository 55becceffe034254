//! Account aggregate and its value types.
//!
//! Purpose: model the credential lifecycle's data. The password only ever
//! appears here as a one-way [`PasswordDigest`]; plaintext never reaches the
//! aggregate and the digest is deliberately not serialisable.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Server-assigned numeric account identifier. Immutable once issued.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors raised by [`LoginId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdValidationError {
    /// Identifier was missing or blank once trimmed.
    Empty,
    /// Identifier contains whitespace.
    ContainsWhitespace,
}

impl fmt::Display for LoginIdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "login identifier must not be empty"),
            Self::ContainsWhitespace => {
                write!(f, "login identifier must not contain whitespace")
            }
        }
    }
}

impl std::error::Error for LoginIdValidationError {}

/// Login identifier, unique across all accounts at all times.
///
/// The uniqueness invariant itself is enforced at the storage boundary; this
/// type only guarantees the value is well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoginId(String);

impl LoginId {
    /// Validate and construct a [`LoginId`].
    pub fn new(value: impl Into<String>) -> Result<Self, LoginIdValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(LoginIdValidationError::Empty);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(LoginIdValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for LoginId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for LoginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LoginId> for String {
    fn from(value: LoginId) -> Self {
        value.0
    }
}

impl TryFrom<String> for LoginId {
    type Error = LoginIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// One-way salted password digest in PHC string format.
///
/// Deliberately implements neither `Serialize` nor `Display`; the digest
/// leaves the process only through [`crate::domain::password`] verification.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Wrap an already-derived digest string.
    #[must_use]
    pub fn new(digest: String) -> Self {
        Self(digest)
    }

    /// Borrow the digest for verification.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

/// Application account.
///
/// ## Invariants
/// - `login_id` is unique across the store at all times.
/// - `password` holds a one-way digest; recoverable plaintext never lands
///   here after creation or update.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Server-assigned identity, immutable.
    pub id: AccountId,
    /// Unique login identifier.
    pub login_id: LoginId,
    /// One-way password digest.
    pub password: PasswordDigest,
    /// Display name.
    pub user_name: String,
    /// Contact phone number.
    pub user_number: String,
    /// Birth date.
    pub birth: NaiveDate,
    /// Sex/gender tag.
    pub sex: String,
}

/// Account data as it exists before the store assigns an identity.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub login_id: LoginId,
    pub password: PasswordDigest,
    pub user_name: String,
    pub user_number: String,
    pub birth: NaiveDate,
    pub sex: String,
}

/// Selective field merge applied to a stored account.
///
/// `None` and empty-string values both mean "leave the stored field alone";
/// an empty string is explicitly *not* a request to clear the value. A
/// supplied password arrives already re-hashed.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub user_name: Option<String>,
    pub user_number: Option<String>,
    pub password: Option<PasswordDigest>,
    pub birth: Option<NaiveDate>,
    pub sex: Option<String>,
}

fn replace_if_supplied(target: &mut String, value: Option<&str>) {
    if let Some(value) = value
        && !value.is_empty()
    {
        value.clone_into(target);
    }
}

impl Account {
    /// Apply a selective merge to this account.
    ///
    /// Called by the repository while it holds the record lock, so the merge
    /// is atomic per call.
    pub fn apply(&mut self, update: &AccountUpdate) {
        replace_if_supplied(&mut self.user_name, update.user_name.as_deref());
        replace_if_supplied(&mut self.user_number, update.user_number.as_deref());
        if let Some(digest) = &update.password {
            self.password = digest.clone();
        }
        if let Some(birth) = update.birth {
            self.birth = birth;
        }
        replace_if_supplied(&mut self.sex, update.sex.as_deref());
    }
}
