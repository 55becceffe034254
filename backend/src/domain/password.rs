//! One-way password hashing.
//!
//! The hasher is a seam: production uses Argon2id with a per-call random
//! salt, tests substitute a cheap stub. There is no decrypt operation by
//! design; verification re-derives from the digest's embedded parameters, so
//! digests remain verifiable if the cost settings ever change.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use thiserror::Error;

use super::account::PasswordDigest;

/// Failure raised while deriving a digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordHashError {
    /// The underlying key-derivation function rejected the input.
    #[error("password digest derivation failed: {message}")]
    Derivation { message: String },
}

/// One-way, salted password transform.
///
/// `verify` must not assume a single fixed salt or cost: each digest carries
/// its own parameters.
pub trait PasswordHasher: Send + Sync {
    /// Derive a salted one-way digest from plaintext.
    fn hash(&self, plaintext: &str) -> Result<PasswordDigest, PasswordHashError>;

    /// Re-derive and compare. Returns `false` for any mismatch or for a
    /// digest this hasher cannot parse.
    fn verify(&self, plaintext: &str, digest: &PasswordDigest) -> bool;
}

/// Argon2id-backed [`PasswordHasher`] producing PHC-format digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<PasswordDigest, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|error| PasswordHashError::Derivation {
                message: error.to_string(),
            })?;
        Ok(PasswordDigest::new(digest.to_string()))
    }

    fn verify(&self, plaintext: &str, digest: &PasswordDigest) -> bool {
        let Ok(parsed) = PasswordHash::new(digest.as_str()) else {
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Cheap deterministic hasher for unit tests. Still one-way enough for the
/// properties under test: the digest is never byte-equal to the plaintext.
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StubPasswordHasher;

#[cfg(test)]
impl PasswordHasher for StubPasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<PasswordDigest, PasswordHashError> {
        Ok(PasswordDigest::new(format!("stub${}", plaintext.len() ^ 0x5a)
            + "$"
            + &plaintext.chars().rev().collect::<String>()))
    }

    fn verify(&self, plaintext: &str, digest: &PasswordDigest) -> bool {
        self.hash(plaintext)
            .is_ok_and(|derived| derived == *digest)
    }
}
