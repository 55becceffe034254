//! In-memory [`AccountRepository`] adapter.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::account::{Account, AccountId, AccountUpdate, LoginId, NewAccount};
use crate::domain::ports::{AccountPersistenceError, AccountRepository};

#[derive(Debug, Default)]
struct AccountsState {
    next_id: i64,
    accounts: BTreeMap<i64, Account>,
}

/// Mutex-guarded account store.
///
/// Login-identifier uniqueness is checked under the same guard as the
/// insert, so two racing registrations for one identifier cannot both
/// succeed.
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    state: Mutex<AccountsState>,
}

impl InMemoryAccountRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, AccountsState>, AccountPersistenceError> {
        self.state
            .lock()
            .map_err(|_| AccountPersistenceError::query("account store lock poisoned"))
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn insert(&self, account: NewAccount) -> Result<Account, AccountPersistenceError> {
        let mut state = self.lock()?;

        if state
            .accounts
            .values()
            .any(|existing| existing.login_id == account.login_id)
        {
            return Err(AccountPersistenceError::duplicate(
                account.login_id.as_str(),
            ));
        }

        state.next_id += 1;
        let stored = Account {
            id: AccountId(state.next_id),
            login_id: account.login_id,
            password: account.password,
            user_name: account.user_name,
            user_number: account.user_number,
            birth: account.birth,
            sex: account.sex,
        };
        state.accounts.insert(stored.id.0, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountPersistenceError> {
        let state = self.lock()?;
        Ok(state.accounts.get(&id.0).cloned())
    }

    async fn find_by_login_id(
        &self,
        login_id: &LoginId,
    ) -> Result<Option<Account>, AccountPersistenceError> {
        let state = self.lock()?;
        Ok(state
            .accounts
            .values()
            .find(|account| account.login_id == *login_id)
            .cloned())
    }

    async fn update(
        &self,
        id: AccountId,
        update: AccountUpdate,
    ) -> Result<Option<Account>, AccountPersistenceError> {
        let mut state = self.lock()?;
        let Some(account) = state.accounts.get_mut(&id.0) else {
            return Ok(None);
        };
        account.apply(&update);
        Ok(Some(account.clone()))
    }
}
