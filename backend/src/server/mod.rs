//! Server assembly: wires adapters, middleware, and routes into a runnable
//! Actix server.
//!
//! Route registration order matters inside each scope: literal segments such
//! as `/near`, `/info`, and `/logout` must be registered before the `/{id}`
//! resource so they are not captured as identifiers.

pub mod config;

use std::sync::Arc;

use actix_cors::Cors;
use actix_session::SessionMiddleware;
use actix_session::config::CookieContentSecurity;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::Server;
use actix_web::http::header;
use actix_web::{App, HttpServer, Scope, web};
use mockable::DefaultClock;
use tracing::info;

use crate::domain::{
    AccountService, Argon2PasswordHasher, Department, DepartmentId, HospitalService,
    PasswordHasher, TRACE_ID_HEADER,
};
use crate::inbound::http::health::{self, HealthState};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{accounts, hospitals};
use crate::middleware::Trace;
use crate::outbound::{InMemoryAccountRepository, InMemoryHospitalRepository, InMemorySessionStore};

pub use config::{ServerConfig, ServerConfigError};

/// Account routes under `/user`.
#[must_use]
pub fn user_scope() -> Scope {
    web::scope("/user")
        .service(accounts::join)
        .service(accounts::login)
        .service(accounts::logout)
        .service(accounts::info)
        .service(accounts::update_account)
        .service(accounts::get_account)
}

/// Hospital directory routes under `/hospitals`.
#[must_use]
pub fn hospital_scope() -> Scope {
    web::scope("/hospitals")
        .service(hospitals::create_hospital)
        .service(hospitals::list_hospitals)
        .service(hospitals::nearby_hospitals)
        .service(hospitals::update_hospital)
        .service(hospitals::add_departments)
        .service(hospitals::get_hospital)
}

/// Session middleware over a signed cookie that carries only the opaque
/// session token.
#[must_use]
pub fn session_middleware(
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .build()
}

/// Department catalogue seeded at startup. Hospitals reference these
/// entries; the catalogue itself is not mutated through the API.
#[must_use]
pub fn department_catalogue() -> Vec<Department> {
    [
        (1, "Internal Medicine"),
        (2, "General Surgery"),
        (3, "Pediatrics"),
        (4, "Obstetrics and Gynaecology"),
        (5, "Orthopaedics"),
        (6, "Dermatology"),
        (7, "Ophthalmology"),
        (8, "Otorhinolaryngology"),
        (9, "Psychiatry"),
        (10, "Dentistry"),
    ]
    .into_iter()
    .map(|(id, name)| Department {
        id: DepartmentId(id),
        name: name.to_string(),
    })
    .collect()
}

/// Wire the in-memory adapters into the handler state.
#[must_use]
pub fn build_http_state(session_timeout: chrono::Duration) -> HttpState {
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher);
    let accounts = AccountService::new(Arc::new(InMemoryAccountRepository::new()), hasher);
    let hospitals = HospitalService::new(Arc::new(InMemoryHospitalRepository::with_departments(
        department_catalogue(),
    )));
    let sessions = InMemorySessionStore::with_timeout(Arc::new(DefaultClock), session_timeout);

    HttpState::new(Arc::new(accounts), Arc::new(hospitals), Arc::new(sessions))
}

fn cors(frontend_origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(frontend_origin)
        .allowed_methods(vec!["GET", "POST", "PATCH"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![TRACE_ID_HEADER])
        .supports_credentials()
        .max_age(3600)
}

/// Build and bind the HTTP server, marking readiness once the listener is
/// up.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        session,
        bind_addr,
        frontend_origin,
    } = config;

    let state = web::Data::new(build_http_state(session.timeout));
    let key = session.key;
    let cookie_secure = session.cookie_secure;
    let same_site = session.same_site;
    let probe_state = health_state.clone();

    let server = HttpServer::new(move || {
        let app = App::new()
            .app_data(health_state.clone())
            .app_data(state.clone())
            .wrap(cors(&frontend_origin))
            .service(
                user_scope()
                    .wrap(Trace)
                    .wrap(session_middleware(key.clone(), cookie_secure, same_site)),
            )
            .service(
                hospital_scope()
                    .wrap(Trace)
                    .wrap(session_middleware(key.clone(), cookie_secure, same_site)),
            )
            .service(health::ready)
            .service(health::live);

        #[cfg(debug_assertions)]
        let app = {
            use utoipa::OpenApi as _;
            app.service(
                utoipa_swagger_ui::SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", crate::ApiDoc::openapi()),
            )
        };

        app
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, "server bound");
    probe_state.mark_ready();
    Ok(server)
}
