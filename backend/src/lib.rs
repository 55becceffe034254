//! Backend library for the Carelink appointment platform.
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] holds the transport-agnostic core: accounts, sessions,
//!   the hospital directory, and the ports they are expressed against.
//! - [`inbound`] adapts HTTP requests onto the domain use-cases.
//! - [`outbound`] provides the driven adapters (in-memory persistence and
//!   the session store).
//! - [`middleware`] carries request-scoped concerns such as trace
//!   identifiers.
//! - [`server`] wires the adapters together into a runnable Actix server.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use doc::ApiDoc;
pub use middleware::Trace;
