//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::{AccountLifecycle, HospitalDirectory, SessionStore};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountLifecycle>,
    pub hospitals: Arc<dyn HospitalDirectory>,
    pub sessions: Arc<dyn SessionStore>,
}

impl HttpState {
    /// Construct state from the port implementations.
    pub fn new(
        accounts: Arc<dyn AccountLifecycle>,
        hospitals: Arc<dyn HospitalDirectory>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            accounts,
            hospitals,
            sessions,
        }
    }
}
