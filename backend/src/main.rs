//! Binary entry point: configures tracing, loads configuration, and runs
//! the HTTP server.
//!
//! A termination signal flips the liveness probe to 503 while actix drains
//! in-flight requests, so orchestrators stop routing traffic to a process
//! that is on its way out.

use actix_web::web;
use mockable::DefaultEnv;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use backend::inbound::http::health::HealthState;
use backend::inbound::http::session_config::BuildMode;
use backend::server::{ServerConfig, create_server};

async fn termination_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(error) => {
                warn!(%error, "failed to register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing subscriber already initialised");
    }

    let config = ServerConfig::from_env(&DefaultEnv::default(), BuildMode::from_debug_assertions())
        .map_err(|error| std::io::Error::other(error.to_string()))?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;

    let probe_state = health_state.clone();
    tokio::spawn(async move {
        termination_signal().await;
        probe_state.mark_unhealthy();
    });

    server.await
}
