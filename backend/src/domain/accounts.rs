//! Account lifecycle domain service.
//!
//! Implements registration, credential authentication, profile reads, and
//! partial profile updates on top of the [`AccountRepository`] port. All
//! plaintext secrets stop here: the service hashes before anything reaches
//! the repository, and authentication reveals nothing about which check
//! failed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use zeroize::Zeroizing;

use super::account::{Account, AccountId, AccountUpdate, LoginId, NewAccount};
use super::auth::LoginCredentials;
use super::error::Error;
use super::password::PasswordHasher;
use super::ports::{AccountPersistenceError, AccountRepository};

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub login_id: LoginId,
    pub password: Zeroizing<String>,
    pub password_confirm: Zeroizing<String>,
    pub user_name: String,
    pub user_number: String,
    pub birth: NaiveDate,
    pub sex: String,
}

/// Partial profile update carrying a plaintext replacement password.
///
/// Absent or empty fields leave the stored value untouched; the service
/// hashes any supplied password before it crosses the repository port.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub user_name: Option<String>,
    pub user_number: Option<String>,
    pub password: Option<Zeroizing<String>>,
    pub birth: Option<NaiveDate>,
    pub sex: Option<String>,
}

/// Driving port for account registration, authentication, and profile
/// maintenance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountLifecycle: Send + Sync {
    /// Register a new account from a validated request.
    async fn register(&self, request: RegistrationRequest) -> Result<Account, Error>;

    /// Check credentials against the store.
    ///
    /// Returns `None` for any failure, whether the identifier is unknown or
    /// the secret does not verify; callers cannot distinguish the two.
    async fn authenticate(&self, credentials: LoginCredentials) -> Result<Option<Account>, Error>;

    /// Fetch an account by identifier.
    async fn get_by_id(&self, id: AccountId) -> Result<Account, Error>;

    /// Merge a partial profile update into the stored account.
    async fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> Result<Account, Error>;
}

/// Account lifecycle service implementing the driving port.
#[derive(Clone)]
pub struct AccountService<R> {
    repo: Arc<R>,
    hasher: Arc<dyn PasswordHasher>,
}

impl<R> AccountService<R> {
    /// Create a new service over the repository and hasher.
    pub fn new(repo: Arc<R>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repo, hasher }
    }
}

impl<R> AccountService<R>
where
    R: AccountRepository,
{
    fn map_persistence_error(error: AccountPersistenceError) -> Error {
        match error {
            AccountPersistenceError::DuplicateLoginId { login_id } => Error::duplicate_identifier(
                format!("login identifier {login_id} is already registered"),
            ),
            AccountPersistenceError::Query { message } => {
                Error::internal(format!("account repository error: {message}"))
            }
        }
    }

    fn validate_registration(request: &RegistrationRequest) -> Result<(), Error> {
        if request.password.is_empty() {
            return Err(Error::validation("password must not be empty"));
        }
        if *request.password != *request.password_confirm {
            return Err(Error::secret_mismatch(
                "password and confirmation do not match",
            ));
        }
        if request.user_name.trim().is_empty() {
            return Err(Error::validation("user name must not be empty"));
        }
        if request.user_number.trim().is_empty() {
            return Err(Error::validation("contact number must not be empty"));
        }
        if request.sex.trim().is_empty() {
            return Err(Error::validation("sex must not be empty"));
        }
        Ok(())
    }

    fn hash_password(&self, plaintext: &str) -> Result<super::account::PasswordDigest, Error> {
        self.hasher
            .hash(plaintext)
            .map_err(|error| Error::internal(format!("password hashing failed: {error}")))
    }
}

#[async_trait]
impl<R> AccountLifecycle for AccountService<R>
where
    R: AccountRepository,
{
    async fn register(&self, request: RegistrationRequest) -> Result<Account, Error> {
        Self::validate_registration(&request)?;
        let digest = self.hash_password(&request.password)?;

        let new_account = NewAccount {
            login_id: request.login_id,
            password: digest,
            user_name: request.user_name,
            user_number: request.user_number,
            birth: request.birth,
            sex: request.sex,
        };

        self.repo
            .insert(new_account)
            .await
            .map_err(Self::map_persistence_error)
    }

    async fn authenticate(&self, credentials: LoginCredentials) -> Result<Option<Account>, Error> {
        // A malformed identifier can never match a stored account, so it is
        // the same "no" as a wrong password.
        let Ok(login_id) = LoginId::new(credentials.identifier()) else {
            return Ok(None);
        };

        let Some(account) = self
            .repo
            .find_by_login_id(&login_id)
            .await
            .map_err(Self::map_persistence_error)?
        else {
            return Ok(None);
        };

        if self.hasher.verify(credentials.password(), &account.password) {
            Ok(Some(account))
        } else {
            Ok(None)
        }
    }

    async fn get_by_id(&self, id: AccountId) -> Result<Account, Error> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| Error::not_found(format!("account {id} does not exist")))
    }

    async fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> Result<Account, Error> {
        let password = match update.password.as_deref().map(String::as_str) {
            // Empty replacement secrets mean "keep the current one", matching
            // the merge rule for the other string fields.
            None | Some("") => None,
            Some(plaintext) => Some(self.hash_password(plaintext)?),
        };

        let merge = AccountUpdate {
            user_name: update.user_name,
            user_number: update.user_number,
            password,
            birth: update.birth,
            sex: update.sex,
        };

        self.repo
            .update(id, merge)
            .await
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| Error::not_found(format!("account {id} does not exist")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::account::PasswordDigest;
    use crate::domain::password::StubPasswordHasher;
    use crate::domain::ports::MockAccountRepository;
    use mockall::predicate::eq;

    fn login_id(value: &str) -> LoginId {
        LoginId::new(value).expect("valid login id")
    }

    fn registration(password: &str, confirm: &str) -> RegistrationRequest {
        RegistrationRequest {
            login_id: login_id("a@x.com"),
            password: Zeroizing::new(password.to_owned()),
            password_confirm: Zeroizing::new(confirm.to_owned()),
            user_name: "Ada".into(),
            user_number: "010-1111-2222".into(),
            birth: NaiveDate::from_ymd_opt(1990, 4, 2).expect("valid date"),
            sex: "F".into(),
        }
    }

    fn stored_account(digest: PasswordDigest) -> Account {
        Account {
            id: AccountId(1),
            login_id: login_id("a@x.com"),
            password: digest,
            user_name: "Ada".into(),
            user_number: "010-1111-2222".into(),
            birth: NaiveDate::from_ymd_opt(1990, 4, 2).expect("valid date"),
            sex: "F".into(),
        }
    }

    fn make_service(repo: MockAccountRepository) -> AccountService<MockAccountRepository> {
        AccountService::new(Arc::new(repo), Arc::new(StubPasswordHasher))
    }

    #[tokio::test]
    async fn register_hashes_before_store() {
        let mut repo = MockAccountRepository::new();
        repo.expect_insert()
            .withf(|new_account: &NewAccount| new_account.password.as_str() != "pw1")
            .times(1)
            .return_once(|new_account| {
                Ok(Account {
                    id: AccountId(1),
                    login_id: new_account.login_id,
                    password: new_account.password,
                    user_name: new_account.user_name,
                    user_number: new_account.user_number,
                    birth: new_account.birth,
                    sex: new_account.sex,
                })
            });

        let service = make_service(repo);
        let account = service
            .register(registration("pw1", "pw1"))
            .await
            .expect("registration succeeds");
        assert_eq!(account.id, AccountId(1));
        assert_ne!(account.password.as_str(), "pw1");
    }

    #[tokio::test]
    async fn register_rejects_mismatched_confirmation() {
        let mut repo = MockAccountRepository::new();
        repo.expect_insert().times(0);

        let service = make_service(repo);
        let error = service
            .register(registration("pw1", "pw2"))
            .await
            .expect_err("mismatch rejected");
        assert_eq!(error.code(), ErrorCode::SecretMismatch);
    }

    #[tokio::test]
    async fn register_maps_duplicate_to_duplicate_identifier() {
        let mut repo = MockAccountRepository::new();
        repo.expect_insert()
            .times(1)
            .return_once(|_| Err(AccountPersistenceError::duplicate("a@x.com")));

        let service = make_service(repo);
        let error = service
            .register(registration("pw1", "pw1"))
            .await
            .expect_err("duplicate rejected");
        assert_eq!(error.code(), ErrorCode::DuplicateIdentifier);
    }

    #[tokio::test]
    async fn authenticate_accepts_matching_credentials() {
        let digest = StubPasswordHasher.hash("pw1").expect("derive digest");
        let account = stored_account(digest);
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_login_id()
            .with(eq(login_id("a@x.com")))
            .times(1)
            .return_once(move |_| Ok(Some(account)));

        let service = make_service(repo);
        let credentials =
            LoginCredentials::try_from_parts("a@x.com", "pw1").expect("valid credentials");
        let resolved = service
            .authenticate(credentials)
            .await
            .expect("lookup succeeds");
        assert_eq!(resolved.map(|account| account.id), Some(AccountId(1)));
    }

    #[tokio::test]
    async fn authenticate_is_opaque_about_the_failure_cause() {
        let digest = StubPasswordHasher.hash("pw1").expect("derive digest");
        let account = stored_account(digest);
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_login_id()
            .times(2)
            .returning(move |queried| {
                if queried.as_str() == "a@x.com" {
                    Ok(Some(account.clone()))
                } else {
                    Ok(None)
                }
            });

        let service = make_service(repo);

        let wrong_password = LoginCredentials::try_from_parts("a@x.com", "nope")
            .expect("valid credentials");
        let unknown_identifier = LoginCredentials::try_from_parts("b@x.com", "pw1")
            .expect("valid credentials");

        assert!(
            service
                .authenticate(wrong_password)
                .await
                .expect("lookup succeeds")
                .is_none()
        );
        assert!(
            service
                .authenticate(unknown_identifier)
                .await
                .expect("lookup succeeds")
                .is_none()
        );
    }

    #[tokio::test]
    async fn get_by_id_maps_missing_to_not_found() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_id()
            .with(eq(AccountId(9)))
            .times(1)
            .return_once(|_| Ok(None));

        let service = make_service(repo);
        let error = service
            .get_by_id(AccountId(9))
            .await
            .expect_err("missing account");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn update_profile_hashes_replacement_password() {
        let mut repo = MockAccountRepository::new();
        repo.expect_update()
            .withf(|_, merge: &AccountUpdate| {
                merge
                    .password
                    .as_ref()
                    .is_some_and(|digest| digest.as_str() != "pw2")
            })
            .times(1)
            .return_once(|_, merge| {
                let mut account = stored_account(
                    merge.password.clone().expect("digest supplied"),
                );
                account.apply(&merge);
                Ok(Some(account))
            });

        let service = make_service(repo);
        let account = service
            .update_profile(
                AccountId(1),
                ProfileUpdate {
                    password: Some(Zeroizing::new("pw2".into())),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .expect("update succeeds");
        assert_ne!(account.password.as_str(), "pw2");
    }

    #[tokio::test]
    async fn update_profile_treats_empty_password_as_no_change() {
        let mut repo = MockAccountRepository::new();
        repo.expect_update()
            .withf(|_, merge: &AccountUpdate| merge.password.is_none())
            .times(1)
            .return_once(|_, _| {
                Ok(Some(stored_account(PasswordDigest::new(
                    "$argon2id$stub".into(),
                ))))
            });

        let service = make_service(repo);
        service
            .update_profile(
                AccountId(1),
                ProfileUpdate {
                    password: Some(Zeroizing::new(String::new())),
                    user_name: Some("Grace".into()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .expect("update succeeds");
    }
}
