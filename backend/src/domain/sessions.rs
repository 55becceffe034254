//! Server-side session model.
//!
//! The browser cookie carries nothing but an opaque [`SessionToken`]; every
//! fact about the session, including which account it belongs to and when it
//! was last seen, lives on the server. A token is therefore useless the
//! moment the server forgets or invalidates its record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountId;

/// Inactivity window after which a session stops resolving.
pub const DEFAULT_SESSION_TIMEOUT_SECS: i64 = 1800;

/// Opaque, unguessable session handle issued at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    /// Issue a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionToken {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(value).map(Self)
    }
}

/// Lifecycle state of a stored session.
///
/// Transitions are one-way: an `Active` session becomes `Invalidated` by an
/// explicit logout or a superseding login, or `Expired` by inactivity.
/// Neither terminal state ever resolves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Invalidated,
    Expired,
}

/// Server-side session record keyed by its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: SessionToken,
    pub account_id: AccountId,
    pub state: SessionState,
    pub last_seen: DateTime<Utc>,
}

impl SessionRecord {
    /// Open a fresh active session for `account_id`.
    #[must_use]
    pub fn begin(account_id: AccountId, now: DateTime<Utc>) -> Self {
        Self {
            token: SessionToken::generate(),
            account_id,
            state: SessionState::Active,
            last_seen: now,
        }
    }

    /// Whether the inactivity window has elapsed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_seen >= timeout
    }

    /// Record activity, pushing the inactivity window forward.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).expect("valid timestamp")
    }

    #[test]
    fn tokens_are_unique_and_round_trip_as_text() {
        let first = SessionToken::generate();
        let second = SessionToken::generate();
        assert_ne!(first, second);

        let parsed: SessionToken = first.to_string().parse().expect("parse token");
        assert_eq!(parsed, first);
    }

    #[test]
    fn record_expires_only_after_the_inactivity_window() {
        let timeout = Duration::seconds(DEFAULT_SESSION_TIMEOUT_SECS);
        let record = SessionRecord::begin(AccountId(7), at(0));
        assert!(!record.is_expired_at(at(0), timeout));
        assert!(!record.is_expired_at(at(DEFAULT_SESSION_TIMEOUT_SECS - 1), timeout));
        assert!(record.is_expired_at(at(DEFAULT_SESSION_TIMEOUT_SECS), timeout));
    }

    #[test]
    fn touch_extends_the_window() {
        let timeout = Duration::seconds(60);
        let mut record = SessionRecord::begin(AccountId(7), at(0));
        record.touch(at(50));
        assert!(!record.is_expired_at(at(100), timeout));
        assert!(record.is_expired_at(at(110), timeout));
    }
}
