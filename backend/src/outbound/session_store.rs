//! In-memory [`SessionStore`] adapter.
//!
//! Holds every session record behind one mutex. `begin` invalidates any
//! prior active session for the account and creates the replacement under
//! the same guard, so no interleaving can observe two live sessions for one
//! account. Time comes from a [`mockable::Clock`] so expiry is testable
//! without sleeping.
//!
//! Invalidated and expired records linger as tombstones so resolution can
//! report why a token died, but only until their inactivity window elapses:
//! every `begin` sweeps records past the window, keeping the map bounded by
//! recent activity rather than total logins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use tracing::warn;

use crate::domain::account::AccountId;
use crate::domain::ports::{SessionResolveError, SessionStore};
use crate::domain::sessions::{
    DEFAULT_SESSION_TIMEOUT_SECS, SessionRecord, SessionState, SessionToken,
};

#[derive(Debug, Default)]
struct SessionsState {
    records: HashMap<SessionToken, SessionRecord>,
    active_by_account: HashMap<AccountId, SessionToken>,
}

impl SessionsState {
    /// Drop every record whose inactivity window has elapsed, active or
    /// terminal, along with any index entry still pointing at it.
    fn sweep(&mut self, now: DateTime<Utc>, timeout: Duration) {
        let Self {
            records,
            active_by_account,
        } = self;
        records.retain(|token, record| {
            if record.is_expired_at(now, timeout) {
                if active_by_account.get(&record.account_id) == Some(token) {
                    active_by_account.remove(&record.account_id);
                }
                false
            } else {
                true
            }
        });
    }
}

/// Mutex-guarded session store with inactivity expiry.
pub struct InMemorySessionStore {
    state: Mutex<SessionsState>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl InMemorySessionStore {
    /// Create a store with the default inactivity window.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_timeout(clock, Duration::seconds(DEFAULT_SESSION_TIMEOUT_SECS))
    }

    /// Create a store with an explicit inactivity window.
    #[must_use]
    pub fn with_timeout(clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            state: Mutex::new(SessionsState::default()),
            clock,
            timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionsState> {
        // A poisoned session mutex means a panic mid-mutation; the state is
        // a plain map and remains usable, so recover the guard.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("session store mutex was poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn begin(&self, account_id: AccountId) -> SessionToken {
        let now = self.clock.utc();
        let mut state = self.lock();
        state.sweep(now, self.timeout);

        if let Some(previous) = state.active_by_account.remove(&account_id)
            && let Some(record) = state.records.get_mut(&previous)
        {
            record.state = SessionState::Invalidated;
        }

        let record = SessionRecord::begin(account_id, now);
        let token = record.token;
        state.records.insert(token, record);
        state.active_by_account.insert(account_id, token);
        token
    }

    async fn resolve(&self, token: SessionToken) -> Result<AccountId, SessionResolveError> {
        let now = self.clock.utc();
        let mut state = self.lock();

        let Some(record) = state.records.get_mut(&token) else {
            return Err(SessionResolveError::Unknown);
        };

        match record.state {
            SessionState::Invalidated => return Err(SessionResolveError::Invalidated),
            SessionState::Expired => return Err(SessionResolveError::Expired),
            SessionState::Active => {}
        }

        if record.is_expired_at(now, self.timeout) {
            record.state = SessionState::Expired;
            let account_id = record.account_id;
            if state.active_by_account.get(&account_id) == Some(&token) {
                state.active_by_account.remove(&account_id);
            }
            return Err(SessionResolveError::Expired);
        }

        record.touch(now);
        Ok(record.account_id)
    }

    async fn end(&self, token: SessionToken) {
        let mut state = self.lock();
        let Some(record) = state.records.get_mut(&token) else {
            return;
        };
        if record.state == SessionState::Active {
            record.state = SessionState::Invalidated;
            let account_id = record.account_id;
            if state.active_by_account.get(&account_id) == Some(&token) {
                state.active_by_account.remove(&account_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Local, Utc};

    struct MutableClock(Mutex<DateTime<Utc>>);

    impl MutableClock {
        fn new(now: DateTime<Utc>) -> Self {
            Self(Mutex::new(now))
        }

        fn advance(&self, delta: Duration) {
            let mut guard = self.0.lock().expect("clock poisoned");
            *guard += delta;
        }
    }

    impl Clock for MutableClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.0.lock().expect("clock poisoned")
        }
    }

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
    }

    fn store_with_clock(timeout_secs: i64) -> (Arc<MutableClock>, InMemorySessionStore) {
        let clock = Arc::new(MutableClock::new(start()));
        let store =
            InMemorySessionStore::with_timeout(clock.clone(), Duration::seconds(timeout_secs));
        (clock, store)
    }

    #[tokio::test]
    async fn begin_then_resolve_returns_the_account() {
        let (_clock, store) = store_with_clock(60);
        let token = store.begin(AccountId(7)).await;
        let resolved = store.resolve(token).await.expect("active session");
        assert_eq!(resolved, AccountId(7));
    }

    #[tokio::test]
    async fn unknown_token_does_not_resolve() {
        let (_clock, store) = store_with_clock(60);
        let error = store
            .resolve(SessionToken::generate())
            .await
            .expect_err("unknown token");
        assert_eq!(error, SessionResolveError::Unknown);
    }

    #[tokio::test]
    async fn second_login_invalidates_the_prior_session() {
        let (_clock, store) = store_with_clock(60);
        let first = store.begin(AccountId(7)).await;
        let second = store.begin(AccountId(7)).await;
        assert_ne!(first, second);

        let error = store.resolve(first).await.expect_err("superseded session");
        assert_eq!(error, SessionResolveError::Invalidated);
        assert_eq!(store.resolve(second).await, Ok(AccountId(7)));
    }

    #[tokio::test]
    async fn logout_invalidates_and_stays_invalid() {
        let (_clock, store) = store_with_clock(60);
        let token = store.begin(AccountId(7)).await;
        store.end(token).await;
        let error = store.resolve(token).await.expect_err("ended session");
        assert_eq!(error, SessionResolveError::Invalidated);

        // Repeat logout of the same token is a no-op.
        store.end(token).await;
        assert_eq!(
            store.resolve(token).await,
            Err(SessionResolveError::Invalidated)
        );
    }

    #[tokio::test]
    async fn session_expires_after_inactivity() {
        let (clock, store) = store_with_clock(60);
        let token = store.begin(AccountId(7)).await;

        clock.advance(Duration::seconds(61));
        let error = store.resolve(token).await.expect_err("expired session");
        assert_eq!(error, SessionResolveError::Expired);

        // Expiry is terminal even if the clock moves back within the window.
        assert_eq!(
            store.resolve(token).await,
            Err(SessionResolveError::Expired)
        );
    }

    #[tokio::test]
    async fn resolve_refreshes_the_inactivity_window() {
        let (clock, store) = store_with_clock(60);
        let token = store.begin(AccountId(7)).await;

        clock.advance(Duration::seconds(50));
        store.resolve(token).await.expect("still active");

        clock.advance(Duration::seconds(50));
        assert_eq!(store.resolve(token).await, Ok(AccountId(7)));
    }

    #[tokio::test]
    async fn superseded_records_are_swept_after_the_window() {
        let (clock, store) = store_with_clock(60);
        let first = store.begin(AccountId(7)).await;
        let _second = store.begin(AccountId(7)).await;
        assert_eq!(
            store.resolve(first).await,
            Err(SessionResolveError::Invalidated)
        );

        // Once the tombstone's window elapses, the next login drops it and
        // the token becomes indistinguishable from one never issued.
        clock.advance(Duration::seconds(61));
        let _ = store.begin(AccountId(8)).await;
        assert_eq!(store.resolve(first).await, Err(SessionResolveError::Unknown));
    }

    #[tokio::test]
    async fn stale_active_records_are_swept_by_the_next_login() {
        let (clock, store) = store_with_clock(60);
        let stale = store.begin(AccountId(7)).await;
        clock.advance(Duration::seconds(61));

        let _fresh = store.begin(AccountId(8)).await;
        assert_eq!(store.resolve(stale).await, Err(SessionResolveError::Unknown));
    }

    #[tokio::test]
    async fn sessions_for_different_accounts_are_independent() {
        let (_clock, store) = store_with_clock(60);
        let first = store.begin(AccountId(1)).await;
        let second = store.begin(AccountId(2)).await;
        assert_eq!(store.resolve(first).await, Ok(AccountId(1)));
        assert_eq!(store.resolve(second).await, Ok(AccountId(2)));
    }
}
