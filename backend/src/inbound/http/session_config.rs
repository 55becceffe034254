//! Session configuration parsing and validation.
//!
//! Centralises the environment-driven session settings so they are validated
//! consistently and can be tested in isolation. Release builds require
//! explicit, valid toggles; debug builds fall back to defaults with a
//! warning.

use std::fmt;
use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use chrono::Duration;
use mockable::Env;
use tracing::warn;
use zeroize::Zeroize;

use crate::domain::DEFAULT_SESSION_TIMEOUT_SECS;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const SAMESITE_ENV: &str = "SESSION_SAMESITE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const TIMEOUT_ENV: &str = "SESSION_TIMEOUT_SECS";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";
const TIMEOUT_EXPECTED: &str = "positive integer seconds";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for missing toggles.
    Debug,
    /// Release builds require explicit, valid session toggles.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Session settings derived from configuration toggles.
pub struct SessionSettings {
    /// Signing key for the session cookie.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// Configured `SameSite` policy for session cookies.
    pub same_site: SameSite,
    /// Inactivity window after which server-side sessions expire.
    pub timeout: Duration,
}

// The signing key never appears in Debug output.
impl fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSettings")
            .field("key", &"<redacted>")
            .field("cookie_secure", &self.cookie_secure)
            .field("same_site", &self.same_site)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
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
    /// Reading the session key file failed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The session key file exists but is too short for release builds.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// `SameSite=None` requires a secure cookie setting in release builds.
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    /// Release builds must not allow ephemeral session keys.
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Build session settings from environment variables and build mode.
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = cookie_secure_from_env(env, mode)?;
    let same_site = same_site_from_env(env, mode, cookie_secure)?;
    let allow_ephemeral = allow_ephemeral_from_env(env, mode)?;
    let key = session_key_from_env(env, mode, allow_ephemeral)?;
    let timeout = timeout_from_env(env, mode)?;

    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
        timeout,
    })
}

fn cookie_secure_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<bool, SessionConfigError> {
    match env.string(COOKIE_SECURE_ENV) {
        Some(value) => match parse_bool(&value) {
            Some(flag) => Ok(flag),
            None => {
                if mode.is_debug() {
                    warn!(
                        value = %value,
                        "invalid SESSION_COOKIE_SECURE; defaulting to secure"
                    );
                    Ok(true)
                } else {
                    Err(SessionConfigError::InvalidEnv {
                        name: COOKIE_SECURE_ENV,
                        value,
                        expected: BOOL_EXPECTED,
                    })
                }
            }
        },
        None => {
            if mode.is_debug() {
                warn!("SESSION_COOKIE_SECURE not set; defaulting to secure");
                Ok(true)
            } else {
                Err(SessionConfigError::MissingEnv {
                    name: COOKIE_SECURE_ENV,
                })
            }
        }
    }
}

fn same_site_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let default_same_site = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };

    let Some(value) = env.string(SAMESITE_ENV) else {
        if mode.is_debug() {
            warn!("SESSION_SAMESITE not set; using default");
            return Ok(default_same_site);
        }
        return Err(SessionConfigError::MissingEnv { name: SAMESITE_ENV });
    };

    match value.to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" => {
            if !cookie_secure {
                if mode.is_debug() {
                    warn!("SESSION_SAMESITE=None with an insecure cookie; browsers may reject it");
                } else {
                    return Err(SessionConfigError::InsecureSameSiteNone);
                }
            }
            Ok(SameSite::None)
        }
        _ => {
            if mode.is_debug() {
                warn!(value = %value, "invalid SESSION_SAMESITE, using default");
                Ok(default_same_site)
            } else {
                Err(SessionConfigError::InvalidEnv {
                    name: SAMESITE_ENV,
                    value,
                    expected: SAMESITE_EXPECTED,
                })
            }
        }
    }
}

fn allow_ephemeral_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<bool, SessionConfigError> {
    match env.string(ALLOW_EPHEMERAL_ENV) {
        Some(value) => match parse_bool(&value) {
            Some(true) => {
                if mode.is_debug() {
                    Ok(true)
                } else {
                    Err(SessionConfigError::EphemeralNotAllowed)
                }
            }
            Some(false) => Ok(false),
            None => {
                if mode.is_debug() {
                    warn!(
                        value = %value,
                        "invalid SESSION_ALLOW_EPHEMERAL; defaulting to disabled"
                    );
                    Ok(false)
                } else {
                    Err(SessionConfigError::InvalidEnv {
                        name: ALLOW_EPHEMERAL_ENV,
                        value,
                        expected: BOOL_EXPECTED,
                    })
                }
            }
        },
        None => {
            if mode.is_debug() {
                warn!("SESSION_ALLOW_EPHEMERAL not set; defaulting to disabled");
                Ok(false)
            } else {
                Err(SessionConfigError::MissingEnv {
                    name: ALLOW_EPHEMERAL_ENV,
                })
            }
        }
    }
}

fn session_key_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    let key_path = env
        .string(KEY_FILE_ENV)
        .unwrap_or_else(|| SESSION_KEY_DEFAULT_PATH.to_string());
    let path = PathBuf::from(key_path);

    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path,
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) => {
            if mode.is_debug() || allow_ephemeral {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "using temporary session key (dev only)"
                );
                Ok(Key::generate())
            } else {
                Err(SessionConfigError::KeyRead {
                    path,
                    source: error,
                })
            }
        }
    }
}

fn timeout_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Duration, SessionConfigError> {
    let Some(value) = env.string(TIMEOUT_ENV) else {
        return Ok(Duration::seconds(DEFAULT_SESSION_TIMEOUT_SECS));
    };

    match value.parse::<i64>() {
        Ok(secs) if secs > 0 => Ok(Duration::seconds(secs)),
        _ => {
            if mode.is_debug() {
                warn!(value = %value, "invalid SESSION_TIMEOUT_SECS; using default");
                Ok(Duration::seconds(DEFAULT_SESSION_TIMEOUT_SECS))
            } else {
                Err(SessionConfigError::InvalidEnv {
                    name: TIMEOUT_ENV,
                    value,
                    expected: TIMEOUT_EXPECTED,
                })
            }
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::MockEnv;
    use rstest::rstest;

    fn env_with(values: Vec<(&'static str, &'static str)>) -> MockEnv {
        let mut env = MockEnv::new();
        env.expect_string().returning(move |name| {
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_string())
        });
        env
    }

    #[test]
    fn debug_mode_defaults_when_unset() {
        let env = env_with(vec![("SESSION_KEY_FILE", "/nonexistent/session_key")]);
        let settings =
            session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");
        assert!(settings.cookie_secure);
        assert_eq!(settings.same_site, SameSite::Lax);
        assert_eq!(
            settings.timeout,
            Duration::seconds(DEFAULT_SESSION_TIMEOUT_SECS)
        );
    }

    #[test]
    fn debug_output_redacts_the_signing_key() {
        let env = env_with(vec![("SESSION_KEY_FILE", "/nonexistent/session_key")]);
        let settings =
            session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");
        let rendered = format!("{settings:?}");
        assert!(rendered.contains("key: \"<redacted>\""));
    }

    #[test]
    fn release_mode_requires_explicit_toggles() {
        let env = env_with(vec![]);
        let error = session_settings_from_env(&env, BuildMode::Release)
            .expect_err("missing toggles rejected");
        assert!(matches!(error, SessionConfigError::MissingEnv { .. }));
    }

    #[test]
    fn release_mode_rejects_insecure_samesite_none() {
        let env = env_with(vec![
            ("SESSION_COOKIE_SECURE", "0"),
            ("SESSION_SAMESITE", "None"),
            ("SESSION_ALLOW_EPHEMERAL", "0"),
        ]);
        let error = session_settings_from_env(&env, BuildMode::Release)
            .expect_err("insecure SameSite=None rejected");
        assert!(matches!(error, SessionConfigError::InsecureSameSiteNone));
    }

    #[test]
    fn release_mode_rejects_ephemeral_keys() {
        let env = env_with(vec![
            ("SESSION_COOKIE_SECURE", "1"),
            ("SESSION_SAMESITE", "Strict"),
            ("SESSION_ALLOW_EPHEMERAL", "1"),
        ]);
        let error = session_settings_from_env(&env, BuildMode::Release)
            .expect_err("ephemeral key rejected");
        assert!(matches!(error, SessionConfigError::EphemeralNotAllowed));
    }

    #[rstest]
    #[case("900", 900)]
    #[case("1800", 1800)]
    fn timeout_parses_positive_seconds(#[case] raw: &'static str, #[case] expected: i64) {
        let env = env_with(vec![
            ("SESSION_TIMEOUT_SECS", raw),
            ("SESSION_KEY_FILE", "/nonexistent/session_key"),
        ]);
        let settings =
            session_settings_from_env(&env, BuildMode::Debug).expect("valid timeout");
        assert_eq!(settings.timeout, Duration::seconds(expected));
    }

    #[rstest]
    #[case("0")]
    #[case("-5")]
    #[case("soon")]
    fn invalid_timeout_falls_back_in_debug(#[case] raw: &'static str) {
        let env = env_with(vec![
            ("SESSION_TIMEOUT_SECS", raw),
            ("SESSION_KEY_FILE", "/nonexistent/session_key"),
        ]);
        let settings =
            session_settings_from_env(&env, BuildMode::Debug).expect("debug fallback");
        assert_eq!(
            settings.timeout,
            Duration::seconds(DEFAULT_SESSION_TIMEOUT_SECS)
        );
    }

    #[test]
    fn invalid_timeout_is_rejected_in_release() {
        let key_path = std::env::temp_dir().join("session_key_timeout_test");
        std::fs::write(&key_path, vec![b'a'; SESSION_KEY_MIN_LEN]).expect("write key");
        let key_path_str: &'static str =
            Box::leak(key_path.to_str().expect("valid path").to_owned().into_boxed_str());

        let env = env_with(vec![
            ("SESSION_COOKIE_SECURE", "1"),
            ("SESSION_SAMESITE", "Strict"),
            ("SESSION_ALLOW_EPHEMERAL", "0"),
            ("SESSION_KEY_FILE", key_path_str),
            ("SESSION_TIMEOUT_SECS", "never"),
        ]);
        let error = session_settings_from_env(&env, BuildMode::Release)
            .expect_err("invalid timeout rejected");
        assert!(matches!(
            error,
            SessionConfigError::InvalidEnv {
                name: "SESSION_TIMEOUT_SECS",
                ..
            }
        ));

        std::fs::remove_file(&key_path).expect("remove key");
    }
}
