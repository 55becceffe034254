//! Account API handlers.
//!
//! ```text
//! POST  /user/join      {"userId":"a@x.com","userPassword":"pw", ...}
//! POST  /user/login     {"userId":"a@x.com","userPassword":"pw"}
//! GET   /user/logout
//! GET   /user/info
//! GET   /user/{id}
//! PATCH /user/accUpdate/{id}
//! ```

use actix_web::{get, patch, post, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use zeroize::Zeroizing;

use crate::domain::{
    Account, AccountId, Error, LoginCredentials, LoginId, ProfileUpdate, RegistrationRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Registration body for `POST /user/join`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub user_id: String,
    pub user_password: String,
    pub user_password2: String,
    pub user_name: String,
    pub user_number: String,
    pub birth: NaiveDate,
    pub sex: String,
}

/// Created-account projection returned by `POST /user/join`.
///
/// No password field is ever serialised, here or anywhere else.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
    pub user_number: String,
    pub birth: NaiveDate,
    pub sex: String,
}

/// Login body for `POST /user/login`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_id: String,
    pub user_password: String,
}

/// Success payload for `POST /user/login`.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
}

/// Account projection for `GET /user/{id}` and `GET /user/info`.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub user_name: String,
    pub user_id: String,
    pub user_number: String,
    pub birth: NaiveDate,
    pub sex: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            user_name: account.user_name,
            user_id: account.login_id.into(),
            user_number: account.user_number,
            birth: account.birth,
            sex: account.sex,
        }
    }
}

/// Partial-update body for `PATCH /user/accUpdate/{id}`.
///
/// Absent and empty-string fields leave the stored value untouched.
#[derive(Deserialize, Serialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdateRequest {
    pub user_name: Option<String>,
    pub user_number: Option<String>,
    pub user_password: Option<String>,
    pub birth: Option<NaiveDate>,
    pub sex: Option<String>,
}

/// Acknowledgement payload for `PATCH /user/accUpdate/{id}`.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdatedResponse {
    pub message: String,
    pub user_name: String,
}

/// Plain acknowledgement payload.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/user/join",
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Account created", body = JoinResponse),
        (status = 400, description = "Invalid request or secret mismatch", body = Error),
        (status = 409, description = "Login identifier already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "join",
    security([])
)]
#[post("/join")]
pub async fn join(
    state: web::Data<HttpState>,
    payload: web::Json<JoinRequest>,
) -> ApiResult<web::Json<JoinResponse>> {
    let payload = payload.into_inner();
    let login_id = LoginId::new(payload.user_id).map_err(|error| {
        Error::validation(error.to_string()).with_details(json!({ "field": "userId" }))
    })?;

    let account = state
        .accounts
        .register(RegistrationRequest {
            login_id,
            password: Zeroizing::new(payload.user_password),
            password_confirm: Zeroizing::new(payload.user_password2),
            user_name: payload.user_name,
            user_number: payload.user_number,
            birth: payload.birth,
            sex: payload.sex,
        })
        .await?;

    Ok(web::Json(JoinResponse {
        id: account.id.0,
        user_id: account.login_id.into(),
        user_name: account.user_name,
        user_number: account.user_number,
        birth: account.birth,
        sex: account.sex,
    }))
}

/// Authenticate and open a session.
///
/// Every failure path returns the same `401 Unauthorized` body, so callers
/// cannot probe which identifiers exist.
#[utoipa::path(
    post,
    path = "/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 401, description = "Login failed", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let payload = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&payload.user_id, &payload.user_password)
        .map_err(|_| login_failed())?;

    let account = state
        .accounts
        .authenticate(credentials)
        .await?
        .ok_or_else(login_failed)?;

    let token = state.sessions.begin(account.id).await;
    session.persist_token(token)?;

    Ok(web::Json(LoginResponse {
        message: "login successful".into(),
        id: account.id.0,
        user_id: account.login_id.into(),
        user_name: account.user_name,
    }))
}

fn login_failed() -> Error {
    Error::unauthorized("login failed")
}

/// End the current session. Succeeds whether or not one exists.
#[utoipa::path(
    get,
    path = "/user/logout",
    responses(
        (status = 200, description = "Session ended", body = MessageResponse),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "logout",
    security([])
)]
#[get("/logout")]
pub async fn logout(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<MessageResponse>> {
    if let Some(token) = session.token()? {
        state.sessions.end(token).await;
    }
    session.clear();
    Ok(web::Json(MessageResponse {
        message: "logout successful".into(),
    }))
}

/// Return the account bound to the current session.
#[utoipa::path(
    get,
    path = "/user/info",
    responses(
        (status = 200, description = "Session-bound account", body = AccountResponse),
        (status = 401, description = "No valid session", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "sessionInfo"
)]
#[get("/info")]
pub async fn info(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AccountResponse>> {
    let account_id = session.require_account(state.sessions.as_ref()).await?;

    match state.accounts.get_by_id(account_id).await {
        Ok(account) => Ok(web::Json(account.into())),
        Err(error) => {
            // A session pointing at a missing account is stale.
            session.clear();
            Err(error)
        }
    }
}

/// Fetch an account by identifier.
#[utoipa::path(
    get,
    path = "/user/{id}",
    params(("id" = i64, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Account", body = AccountResponse),
        (status = 404, description = "Account does not exist", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "getAccount",
    security([])
)]
#[get("/{id}")]
pub async fn get_account(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<AccountResponse>> {
    let account = state.accounts.get_by_id(AccountId(path.into_inner())).await?;
    Ok(web::Json(account.into()))
}

/// Merge a partial profile update into the stored account.
#[utoipa::path(
    patch,
    path = "/user/accUpdate/{id}",
    params(("id" = i64, Path, description = "Account identifier")),
    request_body = AccountUpdateRequest,
    responses(
        (status = 200, description = "Account updated", body = AccountUpdatedResponse),
        (status = 404, description = "Account does not exist", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "updateAccount",
    security([])
)]
#[patch("/accUpdate/{id}")]
pub async fn update_account(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<AccountUpdateRequest>,
) -> ApiResult<web::Json<AccountUpdatedResponse>> {
    let payload = payload.into_inner();
    let account = state
        .accounts
        .update_profile(
            AccountId(path.into_inner()),
            ProfileUpdate {
                user_name: payload.user_name,
                user_number: payload.user_number,
                password: payload.user_password.map(Zeroizing::new),
                birth: payload.birth,
                sex: payload.sex,
            },
        )
        .await?;

    Ok(web::Json(AccountUpdatedResponse {
        message: "account updated".into(),
        user_name: account.user_name,
    }))
}
