//! Server-side password hashing using Argon2id.
//!
//! Logins are looked up by equality on the stored hash, so hashing must
//! be deterministic: the salt is derived from the login instead of being
//! random. Parameters come from `Settings`.

use argon2::{Algorithm, Argon2, Params, Version};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::errors::{KeepVaultError, Result};

/// Length of the derived hash in bytes.
const HASH_LEN: usize = 32;

/// Domain separator for the per-login salt.
const SALT_CONTEXT: &[u8] = b"keepvault-user:";

/// Configurable Argon2id parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 19 456 = 19 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 2).
    pub iterations: u32,
    /// Parallelism lanes (default: 1).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Salt bound to a login so that equal passwords of different users
/// hash differently.
fn login_salt(login: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(SALT_CONTEXT);
    hasher.update(login.as_bytes());
    hasher.finalize().into()
}

/// Hash `password` for `login`, returning a lowercase hex string.
///
/// The same login, password and params always produce the same hash.
pub fn hash_password(login: &str, password: &str, params: &Argon2Params) -> Result<String> {
    let argon_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(HASH_LEN),
    )
    .map_err(|e| KeepVaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let salt = login_salt(login);
    let mut out = [0u8; HASH_LEN];
    argon2
        .hash_password_into(password.as_bytes(), &salt, &mut out)
        .map_err(|e| KeepVaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    let encoded = hex::encode(out);
    out.zeroize();
    Ok(encoded)
}
