//! Server configuration parsed from the environment.
//!
//! Combines the session settings with the network-facing toggles. Release
//! builds require explicit values; debug builds fall back to local-dev
//! defaults with a warning, mirroring the session configuration policy.

use std::net::SocketAddr;

use mockable::Env;
use tracing::warn;

use crate::inbound::http::session_config::{
    BuildMode, SessionConfigError, SessionSettings, session_settings_from_env,
};

const BIND_ADDR_ENV: &str = "BIND_ADDR";
const FRONTEND_ORIGIN_ENV: &str = "FRONTEND_ORIGIN";
const BIND_ADDR_DEFAULT: &str = "127.0.0.1:8080";
const FRONTEND_ORIGIN_DEFAULT: &str = "http://localhost:5173";
const ADDR_EXPECTED: &str = "host:port socket address";
const ORIGIN_EXPECTED: &str = "http(s) origin without a trailing slash";

/// Complete runtime configuration for the HTTP server.
///
/// Debug output inherits the key redaction from [`SessionSettings`].
#[derive(Debug)]
pub struct ServerConfig {
    /// Session cookie and timeout settings.
    pub session: SessionSettings,
    /// Address the server binds to.
    pub bind_addr: SocketAddr,
    /// Single browser origin allowed to make credentialled requests.
    pub frontend_origin: String,
}

/// Errors raised while validating server configuration.
#[derive(thiserror::Error, Debug)]
pub enum ServerConfigError {
    /// Session settings failed to validate.
    #[error(transparent)]
    Session(#[from] SessionConfigError),
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl ServerConfig {
    /// Build the configuration from environment variables and build mode.
    pub fn from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Self, ServerConfigError> {
        let session = session_settings_from_env(env, mode)?;
        let bind_addr = bind_addr_from_env(env, mode)?;
        let frontend_origin = frontend_origin_from_env(env, mode)?;

        Ok(Self {
            session,
            bind_addr,
            frontend_origin,
        })
    }
}

fn bind_addr_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<SocketAddr, ServerConfigError> {
    let Some(value) = env.string(BIND_ADDR_ENV) else {
        if mode == BuildMode::Debug {
            warn!("BIND_ADDR not set; using default");
            return Ok(default_bind_addr());
        }
        return Err(ServerConfigError::MissingEnv {
            name: BIND_ADDR_ENV,
        });
    };

    match value.parse() {
        Ok(addr) => Ok(addr),
        Err(_) => {
            if mode == BuildMode::Debug {
                warn!(value = %value, "invalid BIND_ADDR; using default");
                Ok(default_bind_addr())
            } else {
                Err(ServerConfigError::InvalidEnv {
                    name: BIND_ADDR_ENV,
                    value,
                    expected: ADDR_EXPECTED,
                })
            }
        }
    }
}

fn frontend_origin_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<String, ServerConfigError> {
    let Some(value) = env.string(FRONTEND_ORIGIN_ENV) else {
        if mode == BuildMode::Debug {
            warn!("FRONTEND_ORIGIN not set; using default");
            return Ok(FRONTEND_ORIGIN_DEFAULT.to_string());
        }
        return Err(ServerConfigError::MissingEnv {
            name: FRONTEND_ORIGIN_ENV,
        });
    };

    let valid = (value.starts_with("http://") || value.starts_with("https://"))
        && !value.ends_with('/');
    if valid {
        Ok(value)
    } else if mode == BuildMode::Debug {
        warn!(value = %value, "invalid FRONTEND_ORIGIN; using default");
        Ok(FRONTEND_ORIGIN_DEFAULT.to_string())
    } else {
        Err(ServerConfigError::InvalidEnv {
            name: FRONTEND_ORIGIN_ENV,
            value,
            expected: ORIGIN_EXPECTED,
        })
    }
}

fn default_bind_addr() -> SocketAddr {
    BIND_ADDR_DEFAULT
        .parse()
        .unwrap_or_else(|_| unreachable!("default bind address is well formed"))
}
