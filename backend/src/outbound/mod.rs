//! Driven adapters implementing the domain's outbound ports.

pub mod persistence;
pub mod session_store;

pub use self::persistence::{InMemoryAccountRepository, InMemoryHospitalRepository};
pub use self::session_store::InMemorySessionStore;
