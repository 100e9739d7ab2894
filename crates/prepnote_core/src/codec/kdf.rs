//! Password-based key derivation and password hashing (Argon2id).
//!
//! # Invariants
//! - Derived keys live only in zeroizing buffers.
//! - Parameters read from untrusted input must pass `is_within_limits`
//!   before any derivation runs with them.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::CodecError;

pub const KEY_LEN: usize = 32;
pub const SALT_LEN: usize = 16;

const MAX_MEMORY_KIB: u32 = 256 * 1024;
const MAX_ITERATIONS: u32 = 10;
const MAX_PARALLELISM: u32 = 8;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// Interactive mobile profile: 19 MiB, 2 passes, 1 lane.
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    pub const fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }

    /// Whether these parameters are safe to run when read from an envelope.
    pub fn is_within_limits(&self) -> bool {
        (1..=MAX_PARALLELISM).contains(&self.parallelism)
            && (1..=MAX_ITERATIONS).contains(&self.iterations)
            && (8 * self.parallelism..=MAX_MEMORY_KIB).contains(&self.memory_kib)
    }

    fn argon2(&self) -> Result<Argon2<'static>, CodecError> {
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|err| CodecError::KeyDerivation(err.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Derives a 32-byte symmetric key from `password` and `salt`.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, CodecError> {
    let argon = params.argon2()?;
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon
        .hash_password_into(password, salt, &mut *key)
        .map_err(|err| CodecError::KeyDerivation(err.to_string()))?;
    Ok(key)
}

/// Hashes a password into a self-describing PHC string.
pub fn hash_password(password: &str, params: &KdfParams) -> Result<String, CodecError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = params
        .argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| CodecError::KeyDerivation(err.to_string()))?;
    Ok(hash.to_string())
}

/// Checks `password` against a PHC string produced by `hash_password`.
///
/// Returns `Ok(false)` on mismatch; `Err` only when `phc` is unparseable.
pub fn verify_password(password: &str, phc: &str) -> Result<bool, CodecError> {
    let parsed =
        PasswordHash::new(phc).map_err(|err| CodecError::InvalidPasswordHash(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn generate_salt() -> [u8; SALT_LEN] {
    random_array()
}

pub(crate) fn random_array<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}
