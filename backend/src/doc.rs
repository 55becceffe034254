//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: All HTTP endpoints from the inbound layer (accounts,
//!   hospitals, health)
//! - **Schemas**: Request and response bodies plus the error envelope
//! - **Security**: Session cookie authentication scheme
//!
//! The generated specification drives Swagger UI in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::accounts::{
    AccountResponse, AccountUpdateRequest, AccountUpdatedResponse, JoinRequest, JoinResponse,
    LoginRequest, LoginResponse, MessageResponse,
};
use crate::inbound::http::hospitals::{
    AddDepartmentsRequest, CreateHospitalRequest, DepartmentsResponse, HospitalCreatedResponse,
    HospitalResponse, HospitalUpdateRequest, HospitalUpdatedResponse, RankedHospitalResponse,
};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /user/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Carelink backend API",
        description = "HTTP interface for account, session, and hospital \
                       directory operations."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::join,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::info,
        crate::inbound::http::accounts::get_account,
        crate::inbound::http::accounts::update_account,
        crate::inbound::http::hospitals::create_hospital,
        crate::inbound::http::hospitals::list_hospitals,
        crate::inbound::http::hospitals::nearby_hospitals,
        crate::inbound::http::hospitals::get_hospital,
        crate::inbound::http::hospitals::update_hospital,
        crate::inbound::http::hospitals::add_departments,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        JoinRequest,
        JoinResponse,
        LoginRequest,
        LoginResponse,
        AccountResponse,
        AccountUpdateRequest,
        AccountUpdatedResponse,
        MessageResponse,
        CreateHospitalRequest,
        HospitalCreatedResponse,
        HospitalResponse,
        HospitalUpdateRequest,
        HospitalUpdatedResponse,
        AddDepartmentsRequest,
        DepartmentsResponse,
        RankedHospitalResponse,
    )),
    tags(
        (name = "accounts", description = "Account registration, sessions, and profiles"),
        (name = "hospitals", description = "Hospital directory and proximity search"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
